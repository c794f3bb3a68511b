// Domain errors - Terminal failures of a conversion job

use thiserror::Error;

/// Domain-specific error types
///
/// Every variant is terminal for the job that produced it. The `Display`
/// output is the single message handed to the UI layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Bad or missing trim input; no engine work was performed
    #[error("Invalid trim range: {0}")]
    Validation(String),

    /// The source has no usable video track
    #[error("Could not analyze source: {0}")]
    Analysis(String),

    /// Fixed overhead and audio cost leave no room for video
    #[error(
        "Clip of {duration_seconds:.2}s cannot fit in {target_bytes} bytes: \
         overhead ({overhead_bytes} bytes) and audio ({audio_bytes} bytes) use the whole budget"
    )]
    BudgetExhausted {
        target_bytes: u64,
        duration_seconds: f64,
        overhead_bytes: u64,
        audio_bytes: u64,
    },

    /// The transcode engine failed; never retried
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Every attempt overshot the budget
    #[error(
        "Could not converge under {target_bytes} bytes after {attempts} attempts \
         (last output {last_size_bytes} bytes), trim the clip further"
    )]
    Convergence {
        attempts: u32,
        target_bytes: u64,
        last_size_bytes: u64,
    },
}

impl DomainError {
    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation",
            DomainError::Analysis(_) => "analysis",
            DomainError::BudgetExhausted { .. } => "budget_exhausted",
            DomainError::Encode(_) => "encode",
            DomainError::Convergence { .. } => "convergence",
        }
    }
}
