//! Error types for the poller.

use std::path::PathBuf;

use thiserror::Error;

/// Errors loading or validating the polling configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("Config syntax error: {0}")]
    Syntax(#[from] serde_json::Error),

    /// The JSON is well formed but a field is missing or wrong.
    #[error("Config schema error in {field}: {reason}")]
    Schema { field: String, reason: String },
}

/// Coarse classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    IoError,
    SyntaxError,
    SchemaError,
}

impl ConfigError {
    /// Create a schema error for a field.
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Schema {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> ConfigErrorKind {
        match self {
            ConfigError::Io { .. } => ConfigErrorKind::IoError,
            ConfigError::Syntax(_) => ConfigErrorKind::SyntaxError,
            ConfigError::Schema { .. } => ConfigErrorKind::SchemaError,
        }
    }

    /// Field named by a schema error.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Schema { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Main error type for poller operations.
#[derive(Error, Debug)]
pub enum PollerError {
    /// Polling configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid process settings.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// HTTP client could not be built.
    #[error("Transport setup failed: {0}")]
    Transport(String),

    /// Result set could not be encoded or decoded.
    #[error("Result set JSON error: {0}")]
    Json(#[source] serde_json::Error),

    /// Result file could not be read back.
    #[error("Cannot read results from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Result set could not be written.
    #[error("Cannot write results to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `run` was entered more than once.
    #[error("Scheduler is already running")]
    AlreadyRunning,
}

/// Result type alias for poller operations.
pub type Result<T> = std::result::Result<T, PollerError>;
