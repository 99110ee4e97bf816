//! Semantic similarity between an original text and its processed tokens.
//!
//! The harness only needs a score per sampled record, so scoring sits
//! behind [`SimilarityScorer`]. Two scorers ship:
//! - [`EmbeddingScorer`]: cosine of mean word vectors, when vectors are loaded
//! - [`CharNgramScorer`]: cosine of character n-gram counts, needing nothing

use std::collections::BTreeMap;
use std::sync::LazyLock;

use log::info;
use regex::Regex;

use crate::capability::{Capabilities, WordVectors};
use crate::config::EvalConfig;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// Scores how much of the original text's meaning the processed text keeps.
pub trait SimilarityScorer {
    fn name(&self) -> &str;

    /// Similarity of `original` and `processed`. Zero when either is empty.
    fn similarity(&self, original: &str, processed: &str) -> f64;
}

/// Cosine similarity. Zero if either vector has zero norm.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Mean-pooled word vectors.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingScorer<'a> {
    vectors: &'a WordVectors,
}

impl<'a> EmbeddingScorer<'a> {
    pub fn new(vectors: &'a WordVectors) -> Self {
        Self { vectors }
    }

    /// Mean vector of the known words, or `None` if no word is known.
    fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let mut sum = vec![0.0f32; self.vectors.dim()];
        let mut known = 0usize;
        for word in WORD_RE.find_iter(text) {
            if let Some(vector) = self.vectors.get(word.as_str()) {
                for (acc, v) in sum.iter_mut().zip(vector) {
                    *acc += v;
                }
                known += 1;
            }
        }
        if known == 0 {
            return None;
        }
        sum.iter_mut().for_each(|v| *v /= known as f32);
        Some(sum)
    }
}

impl SimilarityScorer for EmbeddingScorer<'_> {
    fn name(&self) -> &str {
        "embedding"
    }

    fn similarity(&self, original: &str, processed: &str) -> f64 {
        if original.is_empty() || processed.is_empty() {
            return 0.0;
        }
        match (self.embed(original), self.embed(processed)) {
            (Some(a), Some(b)) => cosine(&a, &b),
            _ => 0.0,
        }
    }
}

/// Character n-gram count vectors over the lowercased, space-padded text.
/// Grams are kept ordered so repeated runs sum in the same order.
#[derive(Debug, Clone, Copy)]
pub struct CharNgramScorer {
    n: usize,
}

impl CharNgramScorer {
    pub fn new(n: usize) -> Self {
        Self { n: n.max(1) }
    }

    fn profile(&self, text: &str) -> BTreeMap<String, f64> {
        let padded: Vec<char> = format!(" {} ", text.to_lowercase()).chars().collect();
        let mut counts = BTreeMap::new();
        for gram in padded.windows(self.n) {
            *counts.entry(gram.iter().collect::<String>()).or_insert(0.0) += 1.0;
        }
        counts
    }
}

impl SimilarityScorer for CharNgramScorer {
    fn name(&self) -> &str {
        "char_ngram"
    }

    fn similarity(&self, original: &str, processed: &str) -> f64 {
        if original.is_empty() || processed.is_empty() {
            return 0.0;
        }
        let a = self.profile(original);
        let b = self.profile(processed);

        let dot: f64 = a
            .iter()
            .filter_map(|(gram, x)| b.get(gram).map(|y| x * y))
            .sum();
        let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
        let norm_b = b.values().map(|y| y * y).sum::<f64>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

/// The best scorer the loaded resources allow.
pub fn scorer_for<'a>(
    caps: &'a Capabilities,
    config: &EvalConfig,
) -> Box<dyn SimilarityScorer + 'a> {
    match caps.embeddings.get() {
        Some(vectors) => Box::new(EmbeddingScorer::new(vectors)),
        None => {
            info!(
                "Word vectors unavailable, scoring similarity with character {}-grams",
                config.ngram_size
            );
            Box::new(CharNgramScorer::new(config.ngram_size))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors() -> WordVectors {
        WordVectors::from_vectors([
            ("снег".to_string(), vec![1.0, 0.0]),
            ("зима".to_string(), vec![0.9, 0.1]),
            ("жара".to_string(), vec![0.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_cosine() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_embedding_scorer() {
        let vectors = vectors();
        let scorer = EmbeddingScorer::new(&vectors);
        assert!((scorer.similarity("Снег", "снег") - 1.0).abs() < 1e-6);
        assert!(scorer.similarity("снег", "зима") > scorer.similarity("снег", "жара"));
        assert_eq!(scorer.similarity("снег", "неизвестно"), 0.0);
        assert_eq!(scorer.similarity("снег", ""), 0.0);
    }

    #[test]
    fn test_ngram_scorer() {
        let scorer = CharNgramScorer::new(3);
        assert!((scorer.similarity("привет мир", "привет мир") - 1.0).abs() < 1e-9);
        let stemmed = scorer.similarity("снега выпали", "снег выпал");
        let unrelated = scorer.similarity("снега выпали", "жаркое лето");
        assert!(stemmed > unrelated);
        assert!((0.0..=1.0).contains(&stemmed));
        assert_eq!(scorer.similarity("", "снег"), 0.0);
    }

    #[test]
    fn test_scorer_for_falls_back() {
        let config = EvalConfig::default();
        let caps = Capabilities::none();
        assert_eq!(scorer_for(&caps, &config).name(), "char_ngram");

        let caps = Capabilities::none().with_embeddings(vectors());
        assert_eq!(scorer_for(&caps, &config).name(), "embedding");
    }
}
