//! Text cleaning for scraped news articles.
//!
//! Stages, in the order they run:
//! - HTML tag removal and entity decoding (regex-free state machine)
//! - Unicode NFC normalization
//! - Control character removal
//! - URL removal
//! - Special character removal (emoji, symbols, quotes)
//! - Advertising boiler-plate removal
//! - Whitespace collapsing
//! - Lowercasing
//! - Stop-word removal
//! - Length filtering

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use crate::stopwords;
use crate::tokenize::word_tokenize;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[A-Za-z0-9$%&'()*+,\-./:;<=>?@\[\]^_!]+").expect("url pattern is valid")
});

static SPECIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?]").expect("special pattern is valid"));

/// Boiler-plate phrases that news sites glue onto article bodies.
pub const AD_PHRASES: &[&str] = &[
    "подписывайтесь на наш канал",
    "читайте также",
    "поделиться в соцсетях",
    "источник tass",
    "риа новости",
    "лента новостей",
    "перейти в раздел",
    "реклама",
    "подписаться",
    "больше новостей в",
];

static AD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = AD_PHRASES
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{alternation})")).expect("ad pattern is valid")
});

/// Configuration for text cleaning.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Remove HTML tags and decode entities
    pub remove_html: bool,
    /// Apply Unicode NFC normalization
    pub unicode_nfc: bool,
    /// Remove control characters (except \n \r \t)
    pub remove_control_chars: bool,
    /// Remove http(s) URLs
    pub remove_urls: bool,
    /// Keep only word characters, whitespace and `. , ! ?`
    pub remove_special_chars: bool,
    /// Remove advertising phrases, see [`AD_PHRASES`]
    pub remove_ad_phrases: bool,
    /// Lowercase the result
    pub lowercase: bool,
    /// Drop Russian and news-outlet stop words
    pub remove_stopwords: bool,
    /// Minimum text length after cleaning (bytes)
    pub min_length: usize,
    /// Maximum text length after cleaning (bytes)
    pub max_length: usize,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            remove_html: true,
            unicode_nfc: true,
            remove_control_chars: true,
            remove_urls: true,
            remove_special_chars: true,
            remove_ad_phrases: true,
            lowercase: true,
            remove_stopwords: true,
            min_length: 1,
            max_length: 1_000_000,
        }
    }
}

/// Clean a single article body.
///
/// Returns `None` if nothing is left after cleaning or the result
/// fails the length filter.
pub fn clean_text(text: &str, config: &CleanConfig) -> Option<String> {
    let mut result = if config.remove_html {
        strip_html_tags(text)
    } else {
        text.to_string()
    };

    if config.unicode_nfc {
        result = result.nfc().collect();
    }

    if config.remove_control_chars {
        result = remove_control_characters(&result);
    }

    if config.remove_urls {
        result = URL_RE.replace_all(&result, "").into_owned();
    }

    if config.remove_special_chars {
        result = SPECIAL_RE.replace_all(&result, "").into_owned();
    }

    if config.remove_ad_phrases {
        result = AD_RE.replace_all(&result, "").into_owned();
    }

    result = collapse_whitespace(&result);
    if result.is_empty() {
        return None;
    }

    if config.lowercase {
        result = result.to_lowercase();
    }

    if config.remove_stopwords {
        result = remove_stop_words(&result);
    }

    if result.is_empty() || result.len() < config.min_length || result.len() > config.max_length {
        return None;
    }

    Some(result)
}

/// Strip HTML tags from text without using regex.
///
/// Everything between `<` and `>` is skipped and replaced by a single
/// space so adjacent block elements do not glue words together.
fn strip_html_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                result.push(' ');
            }
            '&' if !in_tag => {
                let entity = decode_html_entity(&mut chars);
                result.push_str(&entity);
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    result
}

/// Decode a single HTML entity starting after the '&'.
fn decode_html_entity(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut entity = String::new();

    // Entities longer than 10 chars are not entities.
    for _ in 0..10 {
        match chars.peek() {
            Some(&';') => {
                chars.next();
                break;
            }
            Some(&c) if c.is_alphanumeric() || c == '#' => {
                entity.push(c);
                chars.next();
            }
            _ => break,
        }
    }

    match entity.as_str() {
        "" => "&".to_string(),
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        "nbsp" => " ".to_string(),
        "laquo" => "«".to_string(),
        "raquo" => "»".to_string(),
        "mdash" => "—".to_string(),
        "ndash" => "–".to_string(),
        s if s.starts_with('#') => {
            let num_str = &s[1..];
            let code_point = match num_str.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num_str.parse::<u32>().ok(),
            };
            match code_point.and_then(char::from_u32) {
                Some(c) => c.to_string(),
                None => format!("&{};", entity),
            }
        }
        _ => format!("&{};", entity),
    }
}

/// Remove control characters except newline, carriage return, and tab.
fn remove_control_characters(text: &str) -> String {
    text.chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\r' || c == '\t')
        .collect()
}

/// Collapse every whitespace run (newlines included) into one space and trim.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn remove_stop_words(text: &str) -> String {
    let stop_words = stopwords::news_russian();
    word_tokenize(text)
        .into_iter()
        .filter(|token| !token.trim().is_empty() && !stop_words.contains(token.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Batch clean multiple documents in parallel.
///
/// Returns only the documents that pass, in input order.
pub fn clean_batch(texts: Vec<String>, config: &CleanConfig) -> Vec<String> {
    use rayon::prelude::*;

    texts
        .into_par_iter()
        .filter_map(|text| clean_text(&text, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keep_words() -> CleanConfig {
        CleanConfig {
            remove_stopwords: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_strip_html() {
        let clean = strip_html_tags("<p>Привет <b>мир</b></p>");
        assert!(clean.contains("Привет"));
        assert!(clean.contains("мир"));
        assert!(!clean.contains("<p>"));
        assert!(!clean.contains("<b>"));
    }

    #[test]
    fn test_html_entities() {
        let clean = strip_html_tags("Том &amp; Джерри, 5 &lt; 10, &#1071;&#x44f;");
        assert!(clean.contains("Том & Джерри"));
        assert!(clean.contains("5 < 10"));
        assert!(clean.contains("Яя"));
    }

    #[test]
    fn test_remove_control_chars() {
        let clean = remove_control_characters("привет\x00мир\x01\nновая строка");
        assert_eq!(clean, "приветмир\nновая строка");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("  привет    мир\n\n\nвторой абзац "),
            "привет мир второй абзац"
        );
    }

    #[test]
    fn test_removes_url_and_ads() {
        let text = "<p>Читайте также: РИА Новости https://ria.ru/2024/01/01/news.html сегодня</p>";
        let clean = clean_text(text, &keep_words()).unwrap();
        assert!(!clean.contains("http"));
        assert!(!clean.contains("читайте"));
        assert!(!clean.contains("риа"));
        assert!(clean.contains("сегодня"));
        assert!(!clean.contains('<'));
    }

    #[test]
    fn test_removes_special_chars() {
        let clean = clean_text("Снег «идёт» 🙂 — тихо!", &keep_words()).unwrap();
        assert_eq!(clean, "снег идёт тихо!");
    }

    #[test]
    fn test_stopwords_removed() {
        let config = CleanConfig::default();
        let clean = clean_text("ТАСС: Я и он пошли в лес.", &config).unwrap();
        assert_eq!(clean, "пошли лес .");
    }

    #[test]
    fn test_keeps_case_when_asked() {
        let config = CleanConfig {
            lowercase: false,
            remove_stopwords: false,
            ..Default::default()
        };
        assert_eq!(clean_text("Москва", &config).unwrap(), "Москва");
    }

    #[test]
    fn test_only_noise_is_rejected() {
        assert!(clean_text("<div>🙂 https://example.com</div>", &CleanConfig::default()).is_none());
        assert!(clean_text("и в на", &CleanConfig::default()).is_none());
    }

    #[test]
    fn test_clean_text_too_short() {
        let config = CleanConfig {
            min_length: 100,
            ..Default::default()
        };
        assert!(clean_text("короткий текст", &config).is_none());
    }

    #[test]
    fn test_batch_preserves_order() {
        let texts = vec![
            "первый".to_string(),
            "<br>".to_string(),
            "второй".to_string(),
        ];
        assert_eq!(
            clean_batch(texts, &CleanConfig::default()),
            vec!["первый", "второй"]
        );
    }
}
