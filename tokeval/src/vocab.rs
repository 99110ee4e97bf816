//! Token vocabularies used for out-of-vocabulary measurement.
//!
//! A vocabulary is the set of distinct tokens seen in some reference
//! stream. The harness builds one per method from the training prefix of
//! its pooled token stream and merges them into a shared union.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{EvalError, Result};

/// A set of distinct tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: HashSet<String>,
}

/// On-disk form: tokens sorted so files diff cleanly.
#[derive(Serialize, Deserialize)]
struct VocabFile {
    size: usize,
    tokens: Vec<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from a token stream.
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut vocab = Self::new();
        vocab.extend(tokens);
        vocab
    }

    /// Add tokens. The vocabulary only ever grows.
    pub fn extend<'a, I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for token in tokens {
            if !self.tokens.contains(token) {
                self.tokens.insert(token.clone());
            }
        }
    }

    /// Merge another vocabulary into this one.
    pub fn union_with(&mut self, other: &Vocabulary) {
        self.extend(other.tokens.iter());
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens in `tokens` absent from this vocabulary.
    pub fn oov_count(&self, tokens: &[String]) -> usize {
        tokens.iter().filter(|t| !self.contains(t)).count()
    }

    /// Tokens in lexicographic order.
    pub fn sorted(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.tokens.iter().cloned().collect();
        tokens.sort();
        tokens
    }

    /// Save vocabulary to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = VocabFile {
            size: self.len(),
            tokens: self.sorted(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(path, json).map_err(|e| EvalError::io(path, e))?;
        Ok(())
    }

    /// Load vocabulary from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let file: VocabFile = serde_json::from_str(&json)?;
        Ok(Self {
            tokens: file.tokens.into_iter().collect(),
        })
    }
}

/// Share of `tokens` absent from `vocab`, in percent. Zero for an empty slice.
pub fn oov_percentage(tokens: &[String], vocab: &Vocabulary) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    vocab.oov_count(tokens) as f64 / tokens.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_new_vocab_is_empty() {
        let vocab = Vocabulary::new();
        assert!(vocab.is_empty());
        assert_eq!(vocab.len(), 0);
    }

    #[test]
    fn test_from_tokens_dedups() {
        let stream = toks(&["привет", "мир", "привет", "снег"]);
        let vocab = Vocabulary::from_tokens(&stream);
        assert_eq!(vocab.len(), 3);
        assert!(vocab.contains("мир"));
        assert!(!vocab.contains("дождь"));
    }

    #[test]
    fn test_union_only_grows() {
        let mut a = Vocabulary::from_tokens(&toks(&["а", "б"]));
        let b = Vocabulary::from_tokens(&toks(&["б", "в"]));
        a.union_with(&b);
        assert_eq!(a.sorted(), toks(&["а", "б", "в"]));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_oov_percentage() {
        let vocab = Vocabulary::from_tokens(&toks(&["привет", "мир"]));
        assert_eq!(oov_percentage(&toks(&["привет", "снег"]), &vocab), 50.0);
        assert_eq!(oov_percentage(&[], &vocab), 0.0);
        assert_eq!(oov_percentage(&toks(&["дождь"]), &Vocabulary::new()), 100.0);
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        let vocab = Vocabulary::from_tokens(&toks(&["снег", "мир"]));
        vocab.save(&path).unwrap();

        let loaded = Vocabulary::load(&path).unwrap();
        assert_eq!(loaded, vocab);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.find("мир").unwrap() < raw.find("снег").unwrap());
    }
}
