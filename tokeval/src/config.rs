//! Evaluation settings.
//!
//! Every field has a default, so a config file only needs the values it
//! changes.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Corpus language. Selects stemmer, stop words and the razdel fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "ru")]
    Russian,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub fn tag(self) -> &'static str {
        match self {
            Language::Russian => "ru",
            Language::English => "en",
        }
    }

    pub fn stop_words(self) -> &'static [&'static str] {
        match self {
            Language::Russian => ruscorp_data_tools::stopwords::RUSSIAN,
            Language::English => ruscorp_data_tools::stopwords::ENGLISH,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ru" | "russian" | "русский" => Ok(Language::Russian),
            "en" | "english" | "английский" => Ok(Language::English),
            other => Err(EvalError::Config(format!("unsupported language {other:?}"))),
        }
    }
}

/// Locations of the optional backing resources.
///
/// A missing path means the resource is not configured and the methods
/// that need it are left out of the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Morphological dictionary (`form<TAB>lemma` or JSON object) for `nltk_pymorphy`
    pub morph_dictionary: Option<PathBuf>,
    /// Lemma lookup table (JSON object or TSV) for `spacy` / `spacy_lem`
    pub lemma_lookup: Option<PathBuf>,
    /// Word vectors in GloVe / word2vec text format for similarity scoring
    pub word_vectors: Option<PathBuf>,
}

/// Configuration for an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Number of leading records scored for similarity
    pub sample_size: usize,
    /// Held-out fraction of the pooled token stream for OOV
    pub test_ratio: f64,
    /// Rows in frequency tables
    pub top_n: usize,
    pub language: Language,
    /// Log progress every N records (0 disables)
    pub log_interval: usize,
    /// Drop a pipeline whose first pass takes longer than this
    pub pipeline_timeout_secs: Option<u64>,
    /// Longest text, in chars, the lookup model accepts
    pub lookup_max_length: usize,
    /// Character n-gram size of the fallback similarity scorer
    pub ngram_size: usize,
    pub resources: ResourceConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            sample_size: 10,
            test_ratio: 0.2,
            top_n: 10,
            language: Language::Russian,
            log_interval: 0,
            pipeline_timeout_secs: None,
            lookup_max_length: 1_000_000,
            ngram_size: 3,
            resources: ResourceConfig::default(),
        }
    }
}

impl EvalConfig {
    /// Load a JSON config file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.test_ratio) {
            return Err(EvalError::Config(format!(
                "test_ratio must be within [0, 1], got {}",
                self.test_ratio
            )));
        }
        if self.ngram_size == 0 {
            return Err(EvalError::Config("ngram_size must be positive".into()));
        }
        Ok(())
    }
}
