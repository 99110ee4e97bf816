//! Error types for the evaluation crate.

use std::path::PathBuf;

use ruscorp_data_tools::CorpusError;
use thiserror::Error;

/// Errors that stop an evaluation or report from being produced.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The corpus could not be read at all.
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Every record lost all of its tokens.
    #[error("no tokens produced by method {0}")]
    NoTokens(String),

    #[error("unknown method {0:?}")]
    UnknownMethod(String),

    #[error("method {method} is unavailable: {reason}")]
    MethodUnavailable { method: String, reason: String },
}

impl EvalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EvalError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A per-record tokenization or normalization failure.
///
/// Never propagated out of the harness: the record yields no tokens and
/// the failure is counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("text of {len} chars exceeds the model limit of {max}")]
    TextTooLong { len: usize, max: usize },
}

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
