//! Optional backing resources and their availability.
//!
//! Heavy resources (a morphological dictionary, a lemma lookup model,
//! word vectors) are loaded once, up front, into a [`Capabilities`]
//! value. Each one records whether it is usable; the pipeline registry
//! consults those flags instead of probing at call sites.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{info, warn};

use crate::config::EvalConfig;
use crate::error::{EvalError, Result};

/// A resource that either loaded or did not.
#[derive(Debug, Clone)]
pub enum Capability<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Capability<T> {
    pub fn not_configured() -> Self {
        Capability::Unavailable {
            reason: "not configured".to_string(),
        }
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Capability::Available(value) => Some(value),
            Capability::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    /// Why the resource is missing, if it is.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Capability::Available(_) => None,
            Capability::Unavailable { reason } => Some(reason),
        }
    }

    fn from_load(name: &str, loaded: Option<Result<T>>) -> Self {
        match loaded {
            None => {
                warn!("Resource {name} unavailable: not configured");
                Capability::not_configured()
            }
            Some(Ok(value)) => {
                info!("Resource {name} loaded");
                Capability::Available(value)
            }
            Some(Err(e)) => {
                warn!("Resource {name} unavailable: {e}");
                Capability::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Word form → lemma table. Keys are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LemmaTable {
    lemmas: HashMap<String, String>,
}

impl LemmaTable {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            lemmas: pairs
                .into_iter()
                .map(|(form, lemma)| (form.as_ref().to_lowercase(), lemma.into()))
                .collect(),
        }
    }

    /// Load from a JSON object (`.json`) or a `form<TAB>lemma` file.
    ///
    /// In the tab-separated form blank lines and `#` comments are ignored;
    /// a line without a tab is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| EvalError::io(path, e))?;
        let reader = BufReader::new(file);

        let table = if path.extension().is_some_and(|ext| ext == "json") {
            let lemmas: HashMap<String, String> = serde_json::from_reader(reader)?;
            Self::from_pairs(lemmas)
        } else {
            let mut pairs = Vec::new();
            for (line_no, line) in reader.lines().enumerate() {
                let line = line.map_err(|e| EvalError::io(path, e))?;
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let (form, lemma) = line.split_once('\t').ok_or_else(|| {
                    EvalError::Config(format!(
                        "{}:{}: expected form<TAB>lemma",
                        path.display(),
                        line_no + 1
                    ))
                })?;
                pairs.push((form.trim().to_string(), lemma.trim().to_string()));
            }
            Self::from_pairs(pairs)
        };

        if table.is_empty() {
            return Err(EvalError::Config(format!(
                "{}: lemma table is empty",
                path.display()
            )));
        }
        Ok(table)
    }

    /// Case-insensitive lookup.
    pub fn lemma(&self, token: &str) -> Option<&str> {
        self.lemmas.get(&token.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

/// The rule tokenizer + lookup lemmatizer pair behind `spacy` / `spacy_lem`.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupModel {
    pub lemmas: LemmaTable,
    /// Texts longer than this many chars are refused.
    pub max_length: usize,
}

/// Dense word vectors for embedding similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct WordVectors {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl WordVectors {
    /// Build from in-memory vectors; all must share one dimension.
    pub fn from_vectors<I>(vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let vectors: HashMap<String, Vec<f32>> = vectors.into_iter().collect();
        let dim = vectors.values().next().map(Vec::len).unwrap_or(0);
        if dim == 0 {
            return Err(EvalError::Config("word vectors are empty".into()));
        }
        if vectors.values().any(|v| v.len() != dim) {
            return Err(EvalError::Config("word vectors differ in dimension".into()));
        }
        Ok(Self { dim, vectors })
    }

    /// Load GloVe (`word v1 v2 ...`) or word2vec text format (same, after
    /// a `count dim` header line). Lines of the wrong width are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| EvalError::io(path, e))?;
        let reader = BufReader::new(file);
        let mut dim = 0;
        let mut vectors = HashMap::new();
        let mut skipped = 0usize;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| EvalError::io(path, e))?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            let values: std::result::Result<Vec<f32>, _> = fields.map(str::parse).collect();
            let Ok(values) = values else {
                skipped += 1;
                continue;
            };
            // word2vec header: "<count> <dim>"
            if line_no == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                continue;
            }
            if dim == 0 {
                dim = values.len();
            }
            if values.is_empty() || values.len() != dim {
                skipped += 1;
                continue;
            }
            vectors.insert(word.to_lowercase(), values);
        }

        if skipped > 0 {
            warn!("{}: skipped {} malformed vector lines", path.display(), skipped);
        }
        Self::from_vectors(vectors)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(&word.to_lowercase()).map(Vec::as_slice)
    }
}

/// Every optional resource, loaded once and shared by reference.
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub morph: Capability<LemmaTable>,
    pub lookup_model: Capability<LookupModel>,
    pub embeddings: Capability<WordVectors>,
}

impl Capabilities {
    /// Nothing optional available.
    pub fn none() -> Self {
        Self {
            morph: Capability::not_configured(),
            lookup_model: Capability::not_configured(),
            embeddings: Capability::not_configured(),
        }
    }

    /// Load whatever `config.resources` points at. Failures are logged
    /// once here and recorded, never returned.
    pub fn load(config: &EvalConfig) -> Self {
        let resources = &config.resources;
        let morph = Capability::from_load(
            "morph_dictionary",
            resources.morph_dictionary.as_deref().map(LemmaTable::load),
        );
        let lookup_model = Capability::from_load(
            "lemma_lookup",
            resources.lemma_lookup.as_deref().map(|path| {
                LemmaTable::load(path).map(|lemmas| LookupModel {
                    lemmas,
                    max_length: config.lookup_max_length,
                })
            }),
        );
        let embeddings = Capability::from_load(
            "word_vectors",
            resources.word_vectors.as_deref().map(WordVectors::load),
        );
        Self {
            morph,
            lookup_model,
            embeddings,
        }
    }

    pub fn with_morph(mut self, table: LemmaTable) -> Self {
        self.morph = Capability::Available(table);
        self
    }

    pub fn with_lookup_model(mut self, model: LookupModel) -> Self {
        self.lookup_model = Capability::Available(model);
        self
    }

    pub fn with_embeddings(mut self, vectors: WordVectors) -> Self {
        self.embeddings = Capability::Available(vectors);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;
    use std::fs;

    #[test]
    fn test_lemma_table_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("morph.tsv");
        fs::write(&path, "# form\tlemma\nСнега\tснег\nшёл\tидти\n\n").unwrap();

        let table = LemmaTable::load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lemma("снега"), Some("снег"));
        assert_eq!(table.lemma("ШЁЛ"), Some("идти"));
        assert_eq!(table.lemma("дождь"), None);
    }

    #[test]
    fn test_lemma_table_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookup.json");
        fs::write(&path, r#"{"мира": "мир", "снегу": "снег"}"#).unwrap();
        assert_eq!(LemmaTable::load(&path).unwrap().lemma("мира"), Some("мир"));
    }

    #[test]
    fn test_lemma_table_rejects_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("morph.tsv");
        fs::write(&path, "снега снег\n").unwrap();
        assert!(LemmaTable::load(&path).is_err());
    }

    #[test]
    fn test_word_vectors_word2vec_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.txt");
        fs::write(&path, "3 2\nснег 1.0 0.0\nмир 0.0 1.0\nплохо 1.0\nДождь 0.5 0.5\n").unwrap();

        let vectors = WordVectors::load(&path).unwrap();
        assert_eq!(vectors.dim(), 2);
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors.get("дождь"), Some(&[0.5f32, 0.5][..]));
        assert!(vectors.get("плохо").is_none());
    }

    #[test]
    fn test_missing_resources_are_unavailable() {
        let config = EvalConfig {
            resources: ResourceConfig {
                morph_dictionary: Some("/definitely/not/here.tsv".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let caps = Capabilities::load(&config);
        assert!(!caps.morph.is_available());
        assert!(caps.morph.reason().unwrap().contains("not/here"));
        assert_eq!(caps.lookup_model.reason(), Some("not configured"));
        assert!(caps.embeddings.get().is_none());
    }

    #[test]
    fn test_builders_mark_available() {
        let caps = Capabilities::none().with_morph(LemmaTable::from_pairs([("снега", "снег")]));
        assert!(caps.morph.is_available());
        assert!(!caps.lookup_model.is_available());
    }
}
