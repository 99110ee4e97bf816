//! Treebank-style word splitting.
//!
//! Shared by the stop-word stage of the cleaner and by the `nltk`
//! evaluation pipeline, so both see the same word boundaries.

use regex::Regex;
use std::sync::LazyLock;

// Order matters: numbers before words so "3,5" is not split at the comma,
// the ellipsis before the single-mark fallback.
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:[.,]\d+)+|\w+(?:[-'’]\w+)*|\.\.\.|[^\w\s]")
        .expect("word pattern is valid")
});

/// Split text into words and punctuation marks.
///
/// Words keep internal hyphens and apostrophes ("из-за", "д'Артаньян"),
/// decimal numbers stay whole, every other punctuation mark becomes its
/// own token except `...`.
pub fn word_tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_punctuation() {
        assert_eq!(word_tokenize("Привет, мир!"), vec!["Привет", ",", "мир", "!"]);
    }

    #[test]
    fn test_keeps_hyphenated_words() {
        assert_eq!(word_tokenize("из-за снега"), vec!["из-за", "снега"]);
    }

    #[test]
    fn test_numbers_and_ellipsis() {
        assert_eq!(word_tokenize("рост 3,5% и..."), vec!["рост", "3,5", "%", "и", "..."]);
    }

    #[test]
    fn test_empty() {
        assert!(word_tokenize("   ").is_empty());
    }
}
