// Job registry - Decides which job may still touch observable state

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::model::JobId;

/// Monotonic job-id counter owned by one controller
///
/// Only the most recently issued id is current. Work carrying any older id
/// is stale and must not report anything.
#[derive(Debug, Default)]
pub struct JobRegistry {
    counter: AtomicU64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new id, superseding whatever was current
    pub fn begin_job(&self) -> JobId {
        JobId(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Supersede the current job without starting another
    pub fn retire_current(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, id: JobId) -> bool {
        self.counter.load(Ordering::SeqCst) == id.0
    }
}
