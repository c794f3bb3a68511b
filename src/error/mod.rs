//! Error handling module for TrimFit

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for TrimFit operations outside the controller
#[derive(Error, Debug)]
pub enum TrimFitError {
    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this tool
    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Configuration value out of range
    #[error("Invalid configuration: {field}: {message}")]
    ConfigInvalid { field: String, message: String },

    /// Output file write error
    #[error("Failed to write output file {path}: {message}")]
    Output { path: PathBuf, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Conversion error surfaced by the controller
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl TrimFitError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        TrimFitError::ConfigInvalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for TrimFit operations
pub type TrimFitResult<T> = std::result::Result<T, TrimFitError>;
