//! Corpus preparation for Russian news text.
//!
//! This crate holds everything that happens before tokenizers are
//! compared:
//!
//! - **Cleaning** (`clean`): HTML removal, URL and advertising phrase
//!   removal, special character filtering, lowercasing and stop-word
//!   removal, with a rayon-parallel batch variant.
//! - **Corpus I/O** (`corpus`): reading line-delimited JSON articles with
//!   field fallback, and rewriting a corpus with a `cleaned_text` field.
//! - **Word splitting** (`tokenize`) and **stop words** (`stopwords`),
//!   shared with the evaluation crate.
//!
//! ## Usage
//!
//! ```rust
//! use ruscorp_data_tools::clean::{clean_text, CleanConfig};
//!
//! let config = CleanConfig::default();
//! let cleaned = clean_text("<p>Выпал &laquo;первый&raquo; снег</p>", &config);
//! assert_eq!(cleaned.as_deref(), Some("выпал первый снег"));
//! ```

pub mod clean;
pub mod corpus;
pub mod error;
pub mod stopwords;
pub mod tokenize;

#[cfg(feature = "python")]
pub mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module entry point
#[cfg(feature = "python")]
#[pymodule]
fn ruscorp_data_tools(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(python::fast_clean_text, m)?)?;
    m.add_function(wrap_pyfunction!(python::fast_clean_batch, m)?)?;
    m.add_function(wrap_pyfunction!(python::read_corpus_texts, m)?)?;
    m.add_function(wrap_pyfunction!(python::clean_corpus_file, m)?)?;
    Ok(())
}

// Re-export main types
pub use clean::{clean_batch, clean_text, CleanConfig};
pub use corpus::{clean_corpus, read_corpus, CleanStats, Corpus, Record, SkipReason};
pub use error::{CorpusError, Result};
pub use tokenize::word_tokenize;
