//! Tokenizer evaluation for Russian news corpora.
//!
//! This crate compares tokenization and normalization pipelines (naive
//! split, regex, treebank-style, word-boundary, rule tokenizer, stemmers
//! and lemmatizers) over one corpus and reports comparable metrics:
//!
//! - Vocabulary size and total token count per method
//! - Similarity of the processed tokens to the original text
//! - Throughput, as time per 1000 records
//! - Out-of-vocabulary rate on a held-out tail of the token stream
//!
//! ## Architecture
//!
//! 1. Optional resources load once into [`Capabilities`]
//! 2. A [`Registry`] lists the methods those resources allow
//! 3. The [`Harness`] runs each pipeline over the corpus, in order
//! 4. [`report`] turns results into HTML, JSON or CSV
//!
//! ## Usage
//!
//! ```rust
//! use ruscorp_tokeval::{Capabilities, EvalConfig, Harness, Language, Registry};
//! use ruscorp_tokeval::similarity::CharNgramScorer;
//!
//! let config = EvalConfig::default();
//! let caps = Capabilities::none();
//! let registry = Registry::build(&caps, Language::Russian);
//! let scorer = CharNgramScorer::new(config.ngram_size);
//!
//! let texts = vec!["привет мир".to_string(), "привет снег".to_string()];
//! let eval = Harness::new(&registry, &scorer, &config).run(&texts);
//! assert_eq!(eval.results[0].method.name(), "naive");
//! assert_eq!(eval.results[0].vocab_size, 3);
//! ```

use std::path::Path;

use serde::Serialize;

pub mod analyze;
pub mod capability;
pub mod config;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod similarity;
pub mod vocab;

#[cfg(feature = "python")]
pub mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module entry point
#[cfg(feature = "python")]
#[pymodule]
fn ruscorp_tokeval(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(python::evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(python::compute_metrics, m)?)?;
    m.add_function(wrap_pyfunction!(python::method_names, m)?)?;
    Ok(())
}

// Re-export main types
pub use analyze::{analyze, Analysis, AnalysisOptions};
pub use capability::{Capabilities, Capability};
pub use config::{EvalConfig, Language, ResourceConfig};
pub use error::{EvalError, Result, TokenizeError};
pub use harness::{Evaluation, Harness, MethodResult};
pub use metrics::{compute_metrics, Metrics};
pub use pipeline::{Method, Pipeline, Registry};
pub use vocab::Vocabulary;

/// An evaluation together with what the reader had to skip.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    /// Corpus lines skipped as malformed or textless.
    pub skipped_records: usize,
}

/// Read a JSONL corpus and evaluate it.
///
/// `methods` restricts the run to a subset; `None` runs every available
/// method. Only an unreadable corpus or invalid config is an error.
pub fn evaluate_corpus(
    path: &Path,
    config: &EvalConfig,
    methods: Option<&[Method]>,
) -> Result<RunSummary> {
    config.validate()?;
    let corpus = ruscorp_data_tools::read_corpus(path)?;

    let caps = Capabilities::load(config);
    let mut registry = Registry::build(&caps, config.language);
    if let Some(methods) = methods {
        registry = registry.only(methods);
    }
    let scorer = similarity::scorer_for(&caps, config);

    let evaluation = Harness::new(&registry, scorer.as_ref(), config).run(&corpus.texts);
    Ok(RunSummary {
        evaluation,
        skipped_records: corpus.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_full_pipeline() {
        // JSONL corpus -> registry -> harness -> results table
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preprocessed_corpus.jsonl");
        fs::write(
            &path,
            concat!(
                "{\"preprocessed_text\": \"выпал первый снег\", \"text\": \"<p>Выпал первый снег</p>\"}\n",
                "{\"title\": \"без текста\"}\n",
                "{\"cleaned_text\": \"снег выпал снова\"}\n",
            ),
        )
        .unwrap();

        let summary = evaluate_corpus(&path, &EvalConfig::default(), None).unwrap();
        assert_eq!(summary.skipped_records, 1);
        assert_eq!(summary.evaluation.records, 2);
        assert_eq!(summary.evaluation.results.len(), 6);
        assert_eq!(summary.evaluation.excluded.len(), 3);

        let naive = &summary.evaluation.results[0];
        assert_eq!(naive.total_tokens, 6);
        assert_eq!(naive.vocab_size, 4);

        // every method's prefix holds at least выпал, первый, снег
        assert!(summary.evaluation.shared_vocab_size >= 3);

        let table = report::results_table(&summary.evaluation);
        assert!(table.contains("excluded nltk_pymorphy"));
    }

    #[test]
    fn test_missing_corpus_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = evaluate_corpus(&dir.path().join("nope.jsonl"), &EvalConfig::default(), None)
            .unwrap_err();
        assert!(matches!(err, EvalError::Corpus(_)));
    }
}
