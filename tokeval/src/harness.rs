//! Tokenizer evaluation harness.
//!
//! Runs every registered pipeline over the same ordered corpus and
//! produces one comparable [`MethodResult`] per pipeline.
//!
//! Algorithm:
//! 1. For each pipeline in registry order, tokenize and normalize every
//!    record, counting tokens and distinct tokens and timing the work
//! 2. Score similarity of the first `sample_size` records against their
//!    processed tokens and average the scores
//! 3. Split the pipeline's pooled token stream by index; the prefix
//!    vocabulary joins a union shared by all pipelines
//! 4. Once every pipeline has run, measure each pipeline's held-out tail
//!    against the shared union

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::EvalConfig;
use crate::metrics::{pool, split_index};
use crate::pipeline::{ExcludedPipeline, Method, Pipeline, Registry};
use crate::similarity::SimilarityScorer;
use crate::vocab::{oov_percentage, Vocabulary};

/// One row of the comparison: a single pipeline over the whole corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodResult {
    pub method: Method,
    /// Distinct tokens over the whole corpus.
    pub vocab_size: usize,
    pub total_tokens: usize,
    /// Mean similarity over the sampled leading records; 0.0 if none.
    pub avg_similarity: f64,
    /// Wall-clock tokenize+normalize time scaled to 1000 records.
    pub time_per_1000_articles: f64,
    /// Share of the held-out tail missing from the shared vocabulary.
    pub oov_percentage: f64,
    /// Records whose tokenize or normalize step failed.
    pub failed_records: usize,
}

impl MethodResult {
    /// Field name → value form for reporters.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Evaluation {
    /// One per surviving pipeline, in registry order.
    pub results: Vec<MethodResult>,
    /// Pipelines left out, because a resource was unavailable or the
    /// pipeline ran out of time.
    pub excluded: Vec<ExcludedPipeline>,
    /// Records evaluated.
    pub records: usize,
    /// Distinct tokens in the union of every surviving pipeline's
    /// training prefix, the baseline all OOV rates are measured against.
    pub shared_vocab_size: usize,
}

/// First-pass output of one pipeline, kept until the shared vocabulary
/// is complete.
struct FirstPass {
    result: MethodResult,
    train_vocab: Vocabulary,
    test_tail: Vec<String>,
}

/// Evaluates a registry of pipelines over a corpus.
pub struct Harness<'h, 'c> {
    registry: &'h Registry<'c>,
    scorer: &'h dyn SimilarityScorer,
    config: &'h EvalConfig,
}

impl<'h, 'c> Harness<'h, 'c> {
    pub fn new(
        registry: &'h Registry<'c>,
        scorer: &'h dyn SimilarityScorer,
        config: &'h EvalConfig,
    ) -> Self {
        Self {
            registry,
            scorer,
            config,
        }
    }

    /// Evaluate every pipeline over `texts`.
    ///
    /// Never fails: bad records yield empty token sequences, an empty
    /// corpus yields zero-valued results.
    pub fn run(&self, texts: &[String]) -> Evaluation {
        let mut excluded = self.registry.excluded().to_vec();
        let mut union = Vocabulary::new();
        let mut passes = Vec::with_capacity(self.registry.len());

        info!(
            "Evaluating {} methods over {} records (similarity: {})",
            self.registry.len(),
            texts.len(),
            self.scorer.name()
        );

        for pipeline in self.registry.pipelines() {
            match self.first_pass(pipeline, texts) {
                Ok(pass) => {
                    union.union_with(&pass.train_vocab);
                    passes.push(pass);
                }
                Err(reason) => {
                    warn!("Method {} excluded: {}", pipeline.method, reason);
                    excluded.push(ExcludedPipeline {
                        method: pipeline.method,
                        reason,
                    });
                }
            }
        }

        debug!("Shared vocabulary: {} tokens", union.len());

        let results = passes
            .into_iter()
            .map(|pass| MethodResult {
                oov_percentage: oov_percentage(&pass.test_tail, &union),
                ..pass.result
            })
            .collect();

        Evaluation {
            results,
            excluded,
            records: texts.len(),
            shared_vocab_size: union.len(),
        }
    }

    /// Tokenize the corpus with one pipeline. `Err` carries the reason the
    /// pipeline is dropped (time budget exhausted).
    fn first_pass(&self, pipeline: &Pipeline<'_>, texts: &[String]) -> Result<FirstPass, String> {
        info!("Processing method: {}", pipeline.method);
        let budget = self.config.pipeline_timeout_secs.map(Duration::from_secs);

        let mut tokens_list: Vec<Vec<String>> = Vec::with_capacity(texts.len());
        let mut vocab = Vocabulary::new();
        let mut total_tokens = 0;
        let mut similarities = Vec::new();
        let mut failed_records = 0;
        let mut elapsed = Duration::ZERO;

        for (i, text) in texts.iter().enumerate() {
            let start = Instant::now();
            let processed = pipeline.process(text);
            elapsed += start.elapsed();

            if let Some(budget) = budget {
                if elapsed >= budget {
                    return Err(format!(
                        "timed out after {} of {} records",
                        i + 1,
                        texts.len()
                    ));
                }
            }

            let tokens = processed.unwrap_or_else(|e| {
                warn!("Method {} failed on record {}: {}", pipeline.method, i, e);
                failed_records += 1;
                Vec::new()
            });

            total_tokens += tokens.len();
            vocab.extend(&tokens);

            if i < self.config.sample_size {
                similarities.push(self.scorer.similarity(text, &tokens.join(" ")));
            }

            if self.config.log_interval > 0 && (i + 1) % self.config.log_interval == 0 {
                debug!(
                    "  {}: {}/{} records, {} tokens",
                    pipeline.method,
                    i + 1,
                    texts.len(),
                    total_tokens
                );
            }

            tokens_list.push(tokens);
        }

        let avg_similarity = if similarities.is_empty() {
            0.0
        } else {
            similarities.iter().sum::<f64>() / similarities.len() as f64
        };
        let time_per_1000_articles = if texts.is_empty() {
            0.0
        } else {
            elapsed.as_secs_f64() / texts.len() as f64 * 1000.0
        };

        let pooled = pool(&tokens_list);
        let split = split_index(pooled.len(), self.config.test_ratio);
        let train_vocab = Vocabulary::from_tokens(&pooled[..split]);
        let test_tail = pooled[split..].to_vec();

        info!(
            "  {}: vocab={} tokens={} similarity={:.4} failed={}",
            pipeline.method,
            vocab.len(),
            total_tokens,
            avg_similarity,
            failed_records
        );

        Ok(FirstPass {
            result: MethodResult {
                method: pipeline.method,
                vocab_size: vocab.len(),
                total_tokens,
                avg_similarity,
                time_per_1000_articles,
                oov_percentage: 0.0,
                failed_records,
            },
            train_vocab,
            test_tail,
        })
    }
}
