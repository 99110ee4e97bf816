use std::path::Path;

use crate::clean::{clean_batch, clean_text, CleanConfig};
use crate::corpus::{clean_corpus, read_corpus};
use pyo3::prelude::*;

/// Clean one article body with the default settings.
/// Returns an empty string if nothing survives cleaning.
#[pyfunction]
pub fn fast_clean_text(text: String) -> String {
    let config = CleanConfig::default();
    clean_text(&text, &config).unwrap_or_default()
}

/// Parallel batch cleaning; rejected documents are dropped.
#[pyfunction]
pub fn fast_clean_batch(texts: Vec<String>) -> Vec<String> {
    let config = CleanConfig::default();
    clean_batch(texts, &config)
}

/// Read the evaluation texts of a JSONL corpus.
#[pyfunction]
pub fn read_corpus_texts(path: &str) -> PyResult<Vec<String>> {
    read_corpus(Path::new(path))
        .map(|corpus| corpus.texts)
        .map_err(|e| pyo3::exceptions::PyIOError::new_err(e.to_string()))
}

/// Clean a JSONL corpus into a new file.
/// Returns `(processed, errors, total_words)`.
#[pyfunction]
#[pyo3(signature = (input, output, to_lower=true, remove_stopwords=true))]
pub fn clean_corpus_file(
    input: &str,
    output: &str,
    to_lower: bool,
    remove_stopwords: bool,
) -> PyResult<(usize, usize, usize)> {
    let config = CleanConfig {
        lowercase: to_lower,
        remove_stopwords,
        ..Default::default()
    };
    let stats = clean_corpus(Path::new(input), Path::new(output), &config)
        .map_err(|e| pyo3::exceptions::PyIOError::new_err(e.to_string()))?;
    Ok((stats.processed, stats.errors, stats.total_words))
}
