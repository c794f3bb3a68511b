// Ports - Interface definitions (contracts)

use crate::domain::errors::*;
use crate::domain::model::*;
use async_trait::async_trait;

/// Port for one-shot media analysis
#[async_trait]
pub trait MediaAnalyzer: Send + Sync {
    /// Report display size, frame rate estimate and audio presence
    ///
    /// Fails with [`DomainError::Analysis`] when there is no video track.
    async fn analyze(&self, source: &SourceHandle) -> Result<AnalysisResult, DomainError>;
}

/// Port for the transcode engine
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Encode the trimmed section of `source` according to `plan`
    ///
    /// Fails with [`DomainError::Encode`]; the returned buffer is owned by
    /// the caller.
    async fn encode(
        &self,
        source: &SourceHandle,
        window: &TrimWindow,
        plan: &EncodePlan,
    ) -> Result<EncodedOutput, DomainError>;
}
