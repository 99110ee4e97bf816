//! Tokenization pipelines and the registry that selects them.
//!
//! A pipeline is a tokenizer optionally followed by a normalizer
//! (stemmer or lemmatizer). The set of pipelines is fixed by [`Method`];
//! each method's stable name is what reports and earlier runs key on.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use log::info;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::capability::{Capabilities, LemmaTable, LookupModel};
use crate::config::Language;
use crate::error::{EvalError, TokenizeError};

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("word pattern is valid"));

/// The evaluated methods, in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Naive,
    Regex,
    Nltk,
    Razdel,
    NltkPorter,
    NltkSnowball,
    Spacy,
    SpacyLem,
    NltkPymorphy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerKind {
    Whitespace,
    WordRegex,
    Treebank,
    WordBoundary,
    Rule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizerKind {
    Porter,
    Snowball,
    LookupLemma,
    MorphLemma,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Method::Naive,
        Method::Regex,
        Method::Nltk,
        Method::Razdel,
        Method::NltkPorter,
        Method::NltkSnowball,
        Method::Spacy,
        Method::SpacyLem,
        Method::NltkPymorphy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Method::Naive => "naive",
            Method::Regex => "regex",
            Method::Nltk => "nltk",
            Method::Razdel => "razdel",
            Method::NltkPorter => "nltk_porter",
            Method::NltkSnowball => "nltk_snowball",
            Method::Spacy => "spacy",
            Method::SpacyLem => "spacy_lem",
            Method::NltkPymorphy => "nltk_pymorphy",
        }
    }

    pub fn tokenizer_kind(self) -> TokenizerKind {
        match self {
            Method::Naive => TokenizerKind::Whitespace,
            Method::Regex => TokenizerKind::WordRegex,
            Method::Nltk | Method::NltkPorter | Method::NltkSnowball | Method::NltkPymorphy => {
                TokenizerKind::Treebank
            }
            Method::Razdel => TokenizerKind::WordBoundary,
            Method::Spacy | Method::SpacyLem => TokenizerKind::Rule,
        }
    }

    pub fn normalizer_kind(self) -> Option<NormalizerKind> {
        match self {
            Method::Naive | Method::Regex | Method::Nltk | Method::Razdel | Method::Spacy => None,
            Method::NltkPorter => Some(NormalizerKind::Porter),
            Method::NltkSnowball => Some(NormalizerKind::Snowball),
            Method::SpacyLem => Some(NormalizerKind::LookupLemma),
            Method::NltkPymorphy => Some(NormalizerKind::MorphLemma),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| EvalError::UnknownMethod(s.to_string()))
    }
}

/// A tokenizer bound to whatever resource it needs.
#[derive(Debug, Clone, Copy)]
pub enum Tokenizer<'a> {
    Whitespace,
    WordRegex,
    Treebank,
    WordBoundary(Language),
    Rule(&'a LookupModel),
}

impl Tokenizer<'_> {
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        let tokens = match self {
            Tokenizer::Whitespace => whitespace_split(text),
            Tokenizer::WordRegex => WORD_RE
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect(),
            Tokenizer::Treebank => ruscorp_data_tools::word_tokenize(text)
                .into_iter()
                .filter(|t| !t.trim().is_empty())
                .collect(),
            Tokenizer::WordBoundary(Language::Russian) => text
                .split_word_bounds()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .collect(),
            Tokenizer::WordBoundary(Language::English) => whitespace_split(text),
            Tokenizer::Rule(model) => rule_tokenize(text, model.max_length)?,
        };
        Ok(tokens)
    }
}

fn whitespace_split(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Whitespace split, then leading and trailing punctuation peeled off
/// into single-character tokens. A chunk with no letters or digits stays
/// whole.
fn rule_tokenize(text: &str, max_length: usize) -> Result<Vec<String>, TokenizeError> {
    let len = text.chars().count();
    if len > max_length {
        return Err(TokenizeError::TextTooLong {
            len,
            max: max_length,
        });
    }

    let mut tokens = Vec::new();
    for chunk in text.split_whitespace() {
        if !chunk.chars().any(char::is_alphanumeric) {
            tokens.push(chunk.to_string());
            continue;
        }
        let start = chunk.find(char::is_alphanumeric).unwrap_or(0);
        let end = chunk
            .rfind(char::is_alphanumeric)
            .map(|i| i + chunk[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(chunk.len());

        tokens.extend(chunk[..start].chars().map(String::from));
        tokens.push(chunk[start..end].to_string());
        tokens.extend(chunk[end..].chars().map(String::from));
    }
    Ok(tokens)
}

/// A normalizer bound to whatever resource it needs.
pub enum Normalizer<'a> {
    Porter(Stemmer),
    Snowball(Stemmer),
    LookupLemma(&'a LookupModel),
    MorphLemma(&'a LemmaTable),
}

impl fmt::Debug for Normalizer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Normalizer::Porter(_) => "Porter",
            Normalizer::Snowball(_) => "Snowball",
            Normalizer::LookupLemma(_) => "LookupLemma",
            Normalizer::MorphLemma(_) => "MorphLemma",
        };
        f.write_str(name)
    }
}

impl Normalizer<'_> {
    pub fn normalize(&self, tokens: Vec<String>) -> Result<Vec<String>, TokenizeError> {
        let normalized = match self {
            Normalizer::Porter(stemmer) | Normalizer::Snowball(stemmer) => tokens
                .iter()
                .map(|t| stemmer.stem(&t.to_lowercase()).into_owned())
                .collect(),
            Normalizer::LookupLemma(model) => {
                // The lemmatizer works on a document, so the tokens are
                // re-joined and re-tokenized first.
                rule_tokenize(&tokens.join(" "), model.max_length)?
                    .into_iter()
                    .map(|t| match model.lemmas.lemma(&t) {
                        Some(lemma) => lemma.to_string(),
                        None => t,
                    })
                    .collect()
            }
            Normalizer::MorphLemma(table) => tokens
                .iter()
                .map(|t| match table.lemma(t) {
                    Some(lemma) => lemma.to_string(),
                    None => t.to_lowercase(),
                })
                .collect(),
        };
        Ok(normalized)
    }
}

fn stemmer_for(language: Language) -> Stemmer {
    match language {
        Language::Russian => Stemmer::create(Algorithm::Russian),
        Language::English => Stemmer::create(Algorithm::English),
    }
}

/// A named tokenize → normalize pair.
#[derive(Debug)]
pub struct Pipeline<'a> {
    pub method: Method,
    pub tokenizer: Tokenizer<'a>,
    pub normalizer: Option<Normalizer<'a>>,
}

impl Pipeline<'_> {
    pub fn name(&self) -> &'static str {
        self.method.name()
    }

    /// Tokenize one text and normalize the tokens.
    pub fn process(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        let tokens = self.tokenizer.tokenize(text)?;
        match &self.normalizer {
            Some(normalizer) => normalizer.normalize(tokens),
            None => Ok(tokens),
        }
    }
}

/// A method left out of a run, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedPipeline {
    pub method: Method,
    pub reason: String,
}

/// The pipelines available for a run, in [`Method::ALL`] order.
#[derive(Debug)]
pub struct Registry<'a> {
    pipelines: Vec<Pipeline<'a>>,
    excluded: Vec<ExcludedPipeline>,
}

impl<'a> Registry<'a> {
    /// Build every method whose backing resource is available.
    pub fn build(caps: &'a Capabilities, language: Language) -> Self {
        let mut pipelines = Vec::new();
        let mut excluded = Vec::new();

        for method in Method::ALL {
            match Self::pipeline(method, caps, language) {
                Ok(pipeline) => pipelines.push(pipeline),
                Err(reason) => {
                    info!("Method {method} excluded: {reason}");
                    excluded.push(ExcludedPipeline { method, reason });
                }
            }
        }

        Self {
            pipelines,
            excluded,
        }
    }

    fn pipeline(
        method: Method,
        caps: &'a Capabilities,
        language: Language,
    ) -> Result<Pipeline<'a>, String> {
        let lookup_model = || {
            caps.lookup_model
                .get()
                .ok_or_else(|| unavailable("lemma_lookup", caps.lookup_model.reason()))
        };
        let morph = || {
            caps.morph
                .get()
                .ok_or_else(|| unavailable("morph_dictionary", caps.morph.reason()))
        };

        let tokenizer = match method.tokenizer_kind() {
            TokenizerKind::Whitespace => Tokenizer::Whitespace,
            TokenizerKind::WordRegex => Tokenizer::WordRegex,
            TokenizerKind::Treebank => Tokenizer::Treebank,
            TokenizerKind::WordBoundary => Tokenizer::WordBoundary(language),
            TokenizerKind::Rule => Tokenizer::Rule(lookup_model()?),
        };
        let normalizer = match method.normalizer_kind() {
            None => None,
            Some(NormalizerKind::Porter) => {
                Some(Normalizer::Porter(Stemmer::create(Algorithm::English)))
            }
            Some(NormalizerKind::Snowball) => Some(Normalizer::Snowball(stemmer_for(language))),
            Some(NormalizerKind::LookupLemma) => Some(Normalizer::LookupLemma(lookup_model()?)),
            Some(NormalizerKind::MorphLemma) => Some(Normalizer::MorphLemma(morph()?)),
        };

        Ok(Pipeline {
            method,
            tokenizer,
            normalizer,
        })
    }

    /// Keep only `methods`, preserving registry order.
    pub fn only(mut self, methods: &[Method]) -> Self {
        self.pipelines.retain(|p| methods.contains(&p.method));
        self.excluded.retain(|e| methods.contains(&e.method));
        self
    }

    pub fn pipelines(&self) -> &[Pipeline<'a>] {
        &self.pipelines
    }

    pub fn get(&self, method: Method) -> Option<&Pipeline<'a>> {
        self.pipelines.iter().find(|p| p.method == method)
    }

    /// Like [`Registry::get`], but explains why a method is missing.
    pub fn require(&self, method: Method) -> Result<&Pipeline<'a>, EvalError> {
        if let Some(pipeline) = self.get(method) {
            return Ok(pipeline);
        }
        let reason = self
            .excluded
            .iter()
            .find(|e| e.method == method)
            .map_or_else(|| "not selected".to_string(), |e| e.reason.clone());
        Err(EvalError::MethodUnavailable {
            method: method.name().to_string(),
            reason,
        })
    }

    /// Methods left out because their resource is unavailable.
    pub fn excluded(&self) -> &[ExcludedPipeline] {
        &self.excluded
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

fn unavailable(resource: &str, reason: Option<&str>) -> String {
    format!("{resource} unavailable ({})", reason.unwrap_or("unknown"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_caps() -> Capabilities {
        Capabilities::none()
            .with_morph(LemmaTable::from_pairs([("снега", "снег"), ("шёл", "идти")]))
            .with_lookup_model(LookupModel {
                lemmas: LemmaTable::from_pairs([("снега", "снег")]),
                max_length: 1000,
            })
    }

    fn run(method: Method, caps: &Capabilities, text: &str) -> Vec<String> {
        Registry::build(caps, Language::Russian)
            .get(method)
            .unwrap()
            .process(text)
            .unwrap()
    }

    #[test]
    fn test_names_round_trip() {
        for method in Method::ALL {
            assert_eq!(method.name().parse::<Method>().unwrap(), method);
            assert_eq!(
                serde_json::to_string(&method).unwrap(),
                format!("\"{}\"", method.name())
            );
        }
        assert!(matches!(
            "bpe".parse::<Method>(),
            Err(EvalError::UnknownMethod(_))
        ));
    }

    #[test]
    fn test_registry_order_and_exclusion() {
        let caps = Capabilities::none();
        let registry = Registry::build(&caps, Language::Russian);
        let names: Vec<&str> = registry.pipelines().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["naive", "regex", "nltk", "razdel", "nltk_porter", "nltk_snowball"]
        );
        let excluded: Vec<Method> = registry.excluded().iter().map(|e| e.method).collect();
        assert_eq!(
            excluded,
            vec![Method::Spacy, Method::SpacyLem, Method::NltkPymorphy]
        );
        assert!(registry.excluded()[0].reason.contains("not configured"));
    }

    #[test]
    fn test_full_registry() {
        let caps = full_caps();
        let registry = Registry::build(&caps, Language::Russian);
        assert_eq!(registry.len(), Method::ALL.len());
        assert!(registry.excluded().is_empty());
    }

    #[test]
    fn test_only_keeps_registry_order() {
        let caps = Capabilities::none();
        let registry =
            Registry::build(&caps, Language::Russian).only(&[
                Method::Razdel,
                Method::Naive,
                Method::Spacy,
            ]);
        let methods: Vec<Method> = registry.pipelines().iter().map(|p| p.method).collect();
        assert_eq!(methods, vec![Method::Naive, Method::Razdel]);
        assert_eq!(registry.excluded().len(), 1);
    }

    #[test]
    fn test_naive_and_regex() {
        let caps = Capabilities::none();
        assert_eq!(run(Method::Naive, &caps, " привет,  мир! "), vec!["привет,", "мир!"]);
        assert_eq!(run(Method::Regex, &caps, "привет, мир!"), vec!["привет", "мир"]);
    }

    #[test]
    fn test_nltk_and_razdel() {
        let caps = Capabilities::none();
        assert_eq!(
            run(Method::Nltk, &caps, "Снег, из-за ветра."),
            vec!["Снег", ",", "из-за", "ветра", "."]
        );
        assert_eq!(
            run(Method::Razdel, &caps, "Снег, ветер."),
            vec!["Снег", ",", "ветер", "."]
        );
    }

    #[test]
    fn test_razdel_english_falls_back_to_whitespace() {
        let caps = Capabilities::none();
        let registry = Registry::build(&caps, Language::English);
        let tokens = registry.get(Method::Razdel).unwrap().process("snow, wind.").unwrap();
        assert_eq!(tokens, vec!["snow,", "wind."]);
    }

    #[test]
    fn test_stemmers_lowercase() {
        let caps = Capabilities::none();
        let stems = run(Method::NltkSnowball, &caps, "Снега");
        assert_eq!(stems, vec!["снег"]);
        let porter = run(Method::NltkPorter, &caps, "Running");
        assert_eq!(porter, vec!["run"]);
    }

    #[test]
    fn test_rule_tokenizer_peels_punctuation() {
        let tokens = rule_tokenize("«Привет», — сказал он...", 100).unwrap();
        assert_eq!(
            tokens,
            vec!["«", "Привет", "»", ",", "—", "сказал", "он", ".", ".", "."]
        );
    }

    #[test]
    fn test_rule_tokenizer_length_limit() {
        assert_eq!(
            rule_tokenize("снег идёт", 3),
            Err(TokenizeError::TextTooLong { len: 9, max: 3 })
        );
    }

    #[test]
    fn test_lemmatizers() {
        let caps = full_caps();
        assert_eq!(run(Method::SpacyLem, &caps, "Снега, Шёл"), vec!["снег", ",", "Шёл"]);
        assert_eq!(
            run(Method::NltkPymorphy, &caps, "Снега шёл Дождь"),
            vec!["снег", "идти", "дождь"]
        );
    }
}
