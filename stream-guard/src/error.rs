//! Error types for stream-guard.
//!
//! The classification path never produces errors for finite input: warm-up and
//! flat windows are ordinary results. Errors come from configuration, from the
//! non-finite input policy, and from exporting the anomaly log.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for stream-guard operations.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Errors that can occur while configuring, feeding or exporting a detector.
#[derive(Error, Debug)]
pub enum GuardError {
    /// Invalid configuration or parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A NaN or infinite sample was rejected before reaching the window.
    #[error("Non-finite sample rejected: {value}")]
    NonFiniteSample { value: f64 },

    /// The anomaly log could not be written to its destination.
    #[error("Failed to export anomalies to '{}': {message}", path.display())]
    Export { path: PathBuf, message: String },

    /// I/O error outside of export (terminal output, config files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with custom message.
    #[error("{0}")]
    Custom(String),
}

impl GuardError {
    /// Creates an invalid configuration error with the given message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates an export error for the given destination.
    pub fn export(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::Export {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Creates a custom error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for GuardError {
    fn from(err: csv::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
