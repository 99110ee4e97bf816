//! Single-method corpus analysis.
//!
//! Applies one pipeline plus post-filters (lowercasing, stop words,
//! minimum token length) to a corpus and computes its [`Metrics`]. This
//! is the data behind the per-method HTML/JSON/CSV reports.

use std::collections::HashSet;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::Language;
use crate::error::{EvalError, Result};
use crate::metrics::{compute_metrics, Metrics, DEFAULT_TEST_RATIO};
use crate::pipeline::Pipeline;
use crate::vocab::Vocabulary;

/// Filters applied after the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub lowercase: bool,
    pub remove_stopwords: bool,
    /// Tokens shorter than this many chars are dropped
    pub min_token_length: usize,
    pub top_n: usize,
    pub test_ratio: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_stopwords: false,
            min_token_length: 1,
            top_n: 10,
            test_ratio: DEFAULT_TEST_RATIO,
        }
    }
}

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub metrics: Metrics,
    /// Records that kept at least one token.
    pub records: usize,
    /// Records left with no tokens after filtering.
    pub dropped_records: usize,
    /// Records whose tokenize or normalize step failed.
    pub failed_records: usize,
    /// Distinct tokens after filtering.
    #[serde(skip)]
    pub vocabulary: Vocabulary,
}

/// Run one pipeline over `texts`, filter, and compute metrics.
///
/// Records that end up with no tokens are left out of the metrics.
/// Fails with [`EvalError::NoTokens`] if that leaves nothing.
pub fn analyze(
    texts: &[String],
    pipeline: &Pipeline<'_>,
    language: Language,
    options: &AnalysisOptions,
) -> Result<Analysis> {
    let stop_words: HashSet<&str> = if options.remove_stopwords {
        language.stop_words().iter().copied().collect()
    } else {
        HashSet::new()
    };

    let mut tokens_list = Vec::with_capacity(texts.len());
    let mut dropped_records = 0;
    let mut failed_records = 0;
    let mut vocabulary = Vocabulary::new();

    for (i, text) in texts.iter().enumerate() {
        let mut tokens = match pipeline.process(text) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Method {} failed on record {}: {}", pipeline.method, i, e);
                failed_records += 1;
                Vec::new()
            }
        };

        if options.lowercase {
            tokens = tokens.into_iter().map(|t| t.to_lowercase()).collect();
        }
        tokens.retain(|t| {
            !stop_words.contains(t.as_str()) && t.chars().count() >= options.min_token_length
        });

        if tokens.is_empty() {
            dropped_records += 1;
        } else {
            vocabulary.extend(&tokens);
            tokens_list.push(tokens);
        }
    }

    if tokens_list.is_empty() {
        return Err(EvalError::NoTokens(pipeline.method.to_string()));
    }

    let metrics = compute_metrics(&tokens_list, options.test_ratio, options.top_n);
    info!(
        "Analysis of {}: {} records, vocab={}, oov={:.2}%",
        pipeline.method,
        tokens_list.len(),
        metrics.vocab_size,
        metrics.oov_percentage
    );

    Ok(Analysis {
        metrics,
        records: tokens_list.len(),
        dropped_records,
        failed_records,
        vocabulary,
    })
}
