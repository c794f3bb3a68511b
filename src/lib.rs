//! TrimFit Library
//!
//! Trims a section out of a video and re-encodes it until the output fits
//! under a hard byte budget, correcting the video bitrate between attempts.
//!
//! The conversion controller lives in [`app::ConvertInteractor`]; media
//! analysis and encoding are reached through the [`ports`] traits so the
//! controller can run against ffmpeg or against test doubles.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod output;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{ConvertInteractor, JobOutcome};
pub use domain::errors::DomainError;
pub use domain::model::{
    AnalysisResult, ArtifactHandle, ConversionSettings, ConversionStatus, EncodePlan,
    EncodedOutput, SourceHandle, TrimWindow,
};
pub use error::{TrimFitError, TrimFitResult};
pub use ports::{MediaAnalyzer, TranscodeEngine};
