//! Line-delimited JSON corpus reading and cleaning.
//!
//! One article per line. The recognized fields are `text` (raw body),
//! `cleaned_text`, `preprocessed_text`, `title` and `url`; any other
//! field is carried through untouched.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::clean::{clean_text, CleanConfig};
use crate::error::{CorpusError, Result};

/// A single corpus article.
///
/// `url` and `title` are informational: a value that is not a string
/// reads as absent instead of rejecting the article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaned_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessed_text: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

impl Record {
    /// The text the evaluation should see.
    ///
    /// The first present field wins, in the order `preprocessed_text`,
    /// `cleaned_text`, `text`. A present but empty field is not skipped
    /// over; the record is simply unusable.
    pub fn best_text(&self) -> Option<&str> {
        self.preprocessed_text
            .as_deref()
            .or(self.cleaned_text.as_deref())
            .or(self.text.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// Why a corpus line was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Not a JSON object with the expected field types.
    Malformed(String),
    /// Valid JSON but no usable text field.
    NoText,
}

/// Texts read from a corpus, in file order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub texts: Vec<String>,
    /// Number of lines skipped as malformed or textless.
    pub skipped: usize,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Parse one corpus line into its evaluation text.
pub fn parse_line(line: &str) -> std::result::Result<String, SkipReason> {
    let record: Record =
        serde_json::from_str(line.trim()).map_err(|e| SkipReason::Malformed(e.to_string()))?;
    record
        .best_text()
        .map(str::to_string)
        .ok_or(SkipReason::NoText)
}

/// Read a JSONL corpus into an ordered list of texts.
///
/// Blank lines are ignored. Malformed or textless lines are skipped with
/// a warning and counted in [`Corpus::skipped`]. Only an unreadable file
/// is an error.
pub fn read_corpus(path: &Path) -> Result<Corpus> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    let reader = BufReader::new(file);
    let mut corpus = Corpus::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("{}:{}: unreadable line: {}", path.display(), line_no + 1, e);
                corpus.skipped += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(&line) {
            Ok(text) => corpus.texts.push(text),
            Err(reason) => {
                warn!("{}:{}: skipped record: {:?}", path.display(), line_no + 1, reason);
                corpus.skipped += 1;
            }
        }
    }

    info!(
        "Read {} texts from {} ({} skipped)",
        corpus.texts.len(),
        path.display(),
        corpus.skipped
    );
    Ok(corpus)
}

/// Outcome of [`clean_corpus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    /// Articles written with a `cleaned_text` field.
    pub processed: usize,
    /// Articles dropped: unreadable line, bad JSON, no `text`, or nothing
    /// left after cleaning.
    pub errors: usize,
    /// Whitespace-separated words across all written `cleaned_text` values.
    pub total_words: usize,
}

/// Clean every article's `text` and write it back with a `cleaned_text` field.
pub fn clean_corpus(input: &Path, output: &Path, config: &CleanConfig) -> Result<CleanStats> {
    let file = File::open(input).map_err(|e| CorpusError::io(input, e))?;
    let reader = BufReader::new(file);
    let out = File::create(output).map_err(|e| CorpusError::io(output, e))?;
    let mut writer = BufWriter::new(out);
    let mut stats = CleanStats::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("{}:{}: unreadable article: {}", input.display(), line_no + 1, e);
                stats.errors += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let mut article: Map<String, Value> = match serde_json::from_str(line.trim()) {
            Ok(article) => article,
            Err(e) => {
                warn!("{}:{}: malformed article: {}", input.display(), line_no + 1, e);
                stats.errors += 1;
                continue;
            }
        };

        let Some(text) = article.get("text").and_then(Value::as_str) else {
            warn!("Skipped article {}: no text field", describe(&article));
            stats.errors += 1;
            continue;
        };

        match clean_text(text, config) {
            Some(cleaned) => {
                stats.total_words += cleaned.split_whitespace().count();
                article.insert("cleaned_text".to_string(), Value::String(cleaned));
                serde_json::to_writer(&mut writer, &article)?;
                writer
                    .write_all(b"\n")
                    .map_err(|e| CorpusError::io(output, e))?;
                stats.processed += 1;
            }
            None => {
                warn!("Skipped article {}: empty cleaned text", describe(&article));
                stats.errors += 1;
            }
        }
    }

    writer.flush().map_err(|e| CorpusError::io(output, e))?;
    debug!("Cleaning stats for {}: {:?}", input.display(), stats);
    Ok(stats)
}

/// `url (title: first 50 chars...)` for log lines.
fn describe(article: &Map<String, Value>) -> String {
    let url = article.get("url").and_then(Value::as_str).unwrap_or("N/A");
    let title: String = article
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("N/A")
        .chars()
        .take(50)
        .collect();
    format!("{} (title: {}...)", url, title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_field_priority() {
        let line = r#"{"text": "сырой", "cleaned_text": "чистый", "preprocessed_text": "готовый"}"#;
        assert_eq!(parse_line(line).unwrap(), "готовый");

        let line = r#"{"text": "сырой", "cleaned_text": "чистый"}"#;
        assert_eq!(parse_line(line).unwrap(), "чистый");

        let line = r#"{"text": "сырой", "url": "https://example.ru"}"#;
        assert_eq!(parse_line(line).unwrap(), "сырой");
    }

    #[test]
    fn test_empty_preferred_field_is_unusable() {
        let line = r#"{"preprocessed_text": "", "text": "сырой"}"#;
        assert_eq!(parse_line(line), Err(SkipReason::NoText));
    }

    #[test]
    fn test_skip_reasons() {
        assert_eq!(parse_line(r#"{"title": "Заголовок"}"#), Err(SkipReason::NoText));
        assert!(matches!(parse_line("{not json"), Err(SkipReason::Malformed(_))));
        assert!(matches!(parse_line(r#"{"text": 42}"#), Err(SkipReason::Malformed(_))));
    }

    #[test]
    fn test_read_corpus_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        fs::write(
            &path,
            "{\"text\": \"привет мир\"}\n\nmusor\n{\"title\": \"без текста\"}\n{\"cleaned_text\": \"привет снег\"}\n",
        )
        .unwrap();

        let corpus = read_corpus(&path).unwrap();
        assert_eq!(corpus.texts, vec!["привет мир", "привет снег"]);
        assert_eq!(corpus.skipped, 2);
    }

    #[test]
    fn test_non_string_metadata_is_ignored() {
        let line = r#"{"text": "привет мир", "title": 2024}"#;
        assert_eq!(parse_line(line).unwrap(), "привет мир");

        let record: Record =
            serde_json::from_str(r#"{"text": "снег", "url": null, "title": ["a"]}"#).unwrap();
        assert_eq!(record.url, None);
        assert_eq!(record.title, None);
        assert_eq!(record.best_text(), Some("снег"));
    }

    #[test]
    fn test_read_corpus_skips_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        let mut bytes = b"{\"text\": \"a\", \"title\": 2024}\n".to_vec();
        bytes.extend_from_slice(b"{\"text\": \"\xff\xfe\"}\n");
        bytes.extend_from_slice(b"{\"text\": \"b\", \"url\": null}\n");
        fs::write(&path, bytes).unwrap();

        let corpus = read_corpus(&path).unwrap();
        assert_eq!(corpus.texts, vec!["a", "b"]);
        assert_eq!(corpus.skipped, 1);
    }

    #[test]
    fn test_read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_corpus(&dir.path().join("nope.jsonl")).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }

    #[test]
    fn test_clean_corpus_adds_field_and_keeps_others() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corpus.jsonl");
        let output = dir.path().join("cleaned.jsonl");
        fs::write(
            &input,
            concat!(
                "{\"url\": \"https://a.ru/1\", \"title\": \"Снег\", \"text\": \"<p>Выпал снег в Москве</p>\", \"date\": \"2024-01-01\"}\n",
                "{\"url\": \"https://a.ru/2\", \"title\": \"Пусто\", \"text\": \"<p>и в на</p>\"}\n",
                "{\"url\": \"https://a.ru/3\"}\n",
                "broken\n",
            ),
        )
        .unwrap();

        let stats = clean_corpus(&input, &output, &CleanConfig::default()).unwrap();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.errors, 3);
        assert_eq!(stats.total_words, 3);

        let written = fs::read_to_string(&output).unwrap();
        let article: Map<String, Value> =
            serde_json::from_str(written.lines().next().unwrap()).unwrap();
        let keys: Vec<&str> = article.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["url", "title", "text", "date", "cleaned_text"]);
        assert_eq!(article["cleaned_text"], "выпал снег москве");
    }

    #[test]
    fn test_clean_corpus_skips_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corpus.jsonl");
        let output = dir.path().join("cleaned.jsonl");
        let mut bytes = "{\"text\": \"Снег выпал\"}\n".as_bytes().to_vec();
        bytes.extend_from_slice(b"{\"text\": \"\xff\xfe\"}\n");
        bytes.extend_from_slice("{\"text\": \"Снег растаял\"}\n".as_bytes());
        fs::write(&input, bytes).unwrap();

        let stats = clean_corpus(&input, &output, &CleanConfig::default()).unwrap();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.errors, 1);

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.contains("снег растаял"));
    }
}
