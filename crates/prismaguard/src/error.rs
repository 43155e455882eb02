//! Error types for prismaguard

use std::path::PathBuf;
use thiserror::Error;

/// Result type for prismaguard operations.
pub type GuardResult<T> = Result<T, GuardError>;

/// Error type for prismaguard operations.
#[derive(Debug, Error)]
pub enum GuardError {
    /// IO error while reading an input file.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed DMMF JSON.
    #[error("Failed to parse DMMF JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Query validation failure (strict mode).
    #[error("{0}")]
    Validation(String),
}

impl GuardError {
    /// Create an IO error tagged with the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GuardError::Io {
            path: path.into(),
            source,
        }
    }
}
