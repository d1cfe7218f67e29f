//! Error types for the CLI

use std::path::PathBuf;

use hdi_common::telemetry::TelemetryError;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Reconcile(#[from] hdi_common::Error),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read cluster document {path}: {message}")]
    InvalidDocument { path: PathBuf, message: String },

    #[error("cluster not found: {id}")]
    ClusterNotFound { id: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("command failed: {message}")]
    CommandFailed { message: String },
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub fn command_failed(message: impl Into<String>) -> Self {
        Error::CommandFailed {
            message: message.into(),
        }
    }
}
