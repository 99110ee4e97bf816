//! Error types for corpus reading and cleaning.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a corpus operation.
///
/// Per-line problems (bad JSON, no text field) are not errors: the line
/// is skipped, logged and counted instead.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The corpus or output file could not be opened or written.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized back to JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CorpusError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CorpusError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for corpus operations.
pub type Result<T> = std::result::Result<T, CorpusError>;
