// Output slot - Holds the single live output artifact

use crate::domain::model::*;

/// Exclusive owner of the one live artifact
///
/// Installing a new artifact drops the previous one in the same call, so
/// two handles are never live at once.
#[derive(Debug, Default)]
pub struct OutputSlot {
    current: Option<OutputArtifact>,
    next_id: u64,
    released: u64,
}

impl OutputSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `output` and hand back its UI handle
    pub fn install(&mut self, job_id: JobId, output: EncodedOutput) -> ArtifactHandle {
        self.next_id += 1;
        let artifact = OutputArtifact::new(self.next_id, job_id, output);
        let handle = artifact.handle();

        if let Some(previous) = self.current.replace(artifact) {
            self.released += 1;
            tracing::debug!(
                artifact_id = previous.id,
                job_id = %previous.job_id,
                created_at = %previous.created_at,
                "Released previous output artifact"
            );
        }

        handle
    }

    /// Drop the held artifact, if any
    pub fn release(&mut self) -> bool {
        match self.current.take() {
            Some(previous) => {
                self.released += 1;
                tracing::debug!(
                    artifact_id = previous.id,
                    job_id = %previous.job_id,
                    created_at = %previous.created_at,
                    "Released output artifact"
                );
                true
            }
            None => false,
        }
    }

    pub fn handle(&self) -> Option<ArtifactHandle> {
        self.current.as_ref().map(OutputArtifact::handle)
    }

    pub fn is_occupied(&self) -> bool {
        self.current.is_some()
    }

    /// Artifacts released over this slot's lifetime
    pub fn released_count(&self) -> u64 {
        self.released
    }
}
