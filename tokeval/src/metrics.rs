//! Corpus-level token metrics.
//!
//! Works on the pooled token stream: every record's tokens concatenated
//! in record order. The stream is split by index, so the held-out part
//! is always its tail and the result is deterministic.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::vocab::{oov_percentage, Vocabulary};

/// Default held-out fraction.
pub const DEFAULT_TEST_RATIO: f64 = 0.2;

/// One row of a frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenFrequency {
    pub token: String,
    pub count: usize,
}

/// Aggregate view of one method's output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    /// Character length of every token, in stream order.
    pub token_lengths: Vec<usize>,
    pub oov_percentage: f64,
    /// Most frequent tokens, descending; ties by first occurrence.
    pub token_freq: Vec<TokenFrequency>,
    pub vocab_size: usize,
    pub oov_count: usize,
    pub test_tokens_count: usize,
    pub total_tokens: usize,
}

impl Metrics {
    pub fn mean_token_length(&self) -> f64 {
        if self.token_lengths.is_empty() {
            return 0.0;
        }
        self.token_lengths.iter().sum::<usize>() as f64 / self.token_lengths.len() as f64
    }

    /// Field name → value form for reporters.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Index at which the pooled stream splits into training prefix and test tail.
pub fn split_index(len: usize, test_ratio: f64) -> usize {
    let ratio = test_ratio.clamp(0.0, 1.0);
    ((len as f64) * (1.0 - ratio)).floor() as usize
}

/// Concatenate per-record token sequences in record order.
pub fn pool(tokens_list: &[Vec<String>]) -> Vec<String> {
    tokens_list.iter().flatten().cloned().collect()
}

/// The `top_n` most frequent tokens.
///
/// Sorted by count descending; equal counts keep first-occurrence order.
pub fn top_frequencies(tokens: &[String], top_n: usize) -> Vec<TokenFrequency> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, token) in tokens.iter().enumerate() {
        counts.entry(token.as_str()).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(token, count, _)| TokenFrequency {
            token: token.to_string(),
            count,
        })
        .collect()
}

/// Compute the metrics bundle for a set of per-record token sequences.
///
/// OOV is the share of the held-out tail (the last `test_ratio` of the
/// pooled stream) missing from the vocabulary of the prefix. An empty
/// stream gives the zero bundle.
pub fn compute_metrics(tokens_list: &[Vec<String>], test_ratio: f64, top_n: usize) -> Metrics {
    let all_tokens = pool(tokens_list);
    if all_tokens.is_empty() {
        return Metrics::default();
    }

    let split = split_index(all_tokens.len(), test_ratio);
    let (train, test) = all_tokens.split_at(split);
    let reference = Vocabulary::from_tokens(train);
    let oov_count = reference.oov_count(test);

    Metrics {
        token_lengths: all_tokens.iter().map(|t| t.chars().count()).collect(),
        oov_percentage: oov_percentage(test, &reference),
        token_freq: top_frequencies(&all_tokens, top_n),
        vocab_size: Vocabulary::from_tokens(&all_tokens).len(),
        oov_count,
        test_tokens_count: test.len(),
        total_tokens: all_tokens.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|t| t.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_empty_stream_is_zero_bundle() {
        let metrics = compute_metrics(&records(&[&[], &[]]), 0.2, 10);
        assert_eq!(metrics, Metrics::default());
        assert_eq!(metrics.mean_token_length(), 0.0);
    }

    #[test]
    fn test_split_index() {
        assert_eq!(split_index(10, 0.2), 8);
        assert_eq!(split_index(4, 0.2), 3);
        assert_eq!(split_index(1, 0.2), 0);
        assert_eq!(split_index(5, 0.0), 5);
        assert_eq!(split_index(5, 1.0), 0);
        assert_eq!(split_index(5, 7.0), 0);
    }

    #[test]
    fn test_oov_on_tail() {
        // pooled: а б а в | г  (split at 4 of 5)
        let metrics = compute_metrics(&records(&[&["а", "б"], &["а", "в", "г"]]), 0.2, 10);
        assert_eq!(metrics.test_tokens_count, 1);
        assert_eq!(metrics.oov_count, 1);
        assert_eq!(metrics.oov_percentage, 100.0);
        assert_eq!(metrics.vocab_size, 4);
        assert_eq!(metrics.total_tokens, 5);
    }

    #[test]
    fn test_tail_seen_in_prefix() {
        let tokens = records(&[&["снег", "мир"], &["снег", "мир", "снег"]]);
        let metrics = compute_metrics(&tokens, 0.2, 10);
        assert_eq!(metrics.oov_count, 0);
        assert_eq!(metrics.oov_percentage, 0.0);
    }

    #[test]
    fn test_zero_ratio_has_no_test_tokens() {
        let metrics = compute_metrics(&records(&[&["а", "б"]]), 0.0, 10);
        assert_eq!(metrics.test_tokens_count, 0);
        assert_eq!(metrics.oov_percentage, 0.0);
    }

    #[test]
    fn test_frequency_ties_by_first_occurrence() {
        let tokens: Vec<String> = ["в", "снег", "мир", "снег", "мир", "в", "дом"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let freq = top_frequencies(&tokens, 3);
        let ranked: Vec<(&str, usize)> =
            freq.iter().map(|f| (f.token.as_str(), f.count)).collect();
        assert_eq!(ranked, vec![("в", 2), ("снег", 2), ("мир", 2)]);
    }

    #[test]
    fn test_token_lengths_count_chars() {
        let metrics = compute_metrics(&records(&[&["ёж", "snow"]]), 0.2, 10);
        assert_eq!(metrics.token_lengths, vec![2, 4]);
        assert_eq!(metrics.mean_token_length(), 3.0);
    }

    #[test]
    fn test_to_map_fields() {
        let map = compute_metrics(&records(&[&["а"]]), 0.2, 10).to_map();
        for key in [
            "token_lengths",
            "oov_percentage",
            "token_freq",
            "vocab_size",
            "oov_count",
            "test_tokens_count",
        ] {
            assert!(map.contains_key(key), "missing {key}");
        }
    }
}
