//! Command-line front end: clean a corpus, compare tokenizers, analyze one method.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use ruscorp_data_tools::{clean_corpus, read_corpus, CleanConfig};
use ruscorp_tokeval::report::{self, ReportContext};
use ruscorp_tokeval::{
    analyze, evaluate_corpus, AnalysisOptions, Capabilities, EvalConfig, Language, Method,
    Registry,
};

#[derive(Parser)]
#[command(name = "tokeval")]
#[command(about = "Russian news corpus preparation and tokenizer evaluation", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a raw JSONL corpus, adding a `cleaned_text` field
    Clean {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Do not lowercase text
        #[arg(long)]
        keep_case: bool,

        /// Do not remove stop words
        #[arg(long)]
        keep_stopwords: bool,
    },

    /// Run every available tokenization method over a corpus
    Evaluate {
        #[arg(short, long)]
        corpus: PathBuf,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Comma-separated method names (default: all available)
        #[arg(short, long, value_delimiter = ',')]
        methods: Vec<String>,

        /// Override the number of records scored for similarity
        #[arg(long)]
        sample_size: Option<usize>,

        #[arg(long)]
        results_csv: Option<PathBuf>,

        #[arg(long)]
        results_json: Option<PathBuf>,
    },

    /// Analyze a corpus with a single method and write reports
    Analyze {
        #[arg(short, long)]
        corpus: PathBuf,

        #[arg(short, long, default_value = "nltk")]
        method: String,

        #[arg(short, long, default_value = "ru")]
        language: Language,

        /// JSON config file (resources for lemmatizing methods)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep the original case of tokens
        #[arg(long)]
        keep_case: bool,

        #[arg(long)]
        remove_stopwords: bool,

        #[arg(long, default_value = "1")]
        min_token_length: usize,

        #[arg(long, default_value = "10")]
        top_n: usize,

        /// HTML report path
        #[arg(long)]
        html: Option<PathBuf>,

        /// JSON export path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Frequency table CSV path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Sorted vocabulary JSON path
        #[arg(long)]
        vocab_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    match cli.command {
        Commands::Clean {
            input,
            output,
            keep_case,
            keep_stopwords,
        } => run_clean(&input, &output, keep_case, keep_stopwords),
        Commands::Evaluate {
            corpus,
            config,
            methods,
            sample_size,
            results_csv,
            results_json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(sample_size) = sample_size {
                config.sample_size = sample_size;
            }
            run_evaluate(
                &corpus,
                &config,
                &methods,
                results_csv.as_deref(),
                results_json.as_deref(),
            )
        }
        Commands::Analyze {
            corpus,
            method,
            language,
            config,
            keep_case,
            remove_stopwords,
            min_token_length,
            top_n,
            html,
            json,
            csv,
            vocab_out,
        } => {
            let mut config = load_config(config.as_deref())?;
            config.language = language;
            let options = AnalysisOptions {
                lowercase: !keep_case,
                remove_stopwords,
                min_token_length,
                top_n,
                test_ratio: config.test_ratio,
            };
            let outputs = Outputs {
                html,
                json,
                csv,
                vocab_out,
            };
            run_analyze(&corpus, &method, &config, &options, &outputs)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EvalConfig> {
    match path {
        Some(path) => EvalConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(EvalConfig::default()),
    }
}

fn run_clean(input: &Path, output: &Path, keep_case: bool, keep_stopwords: bool) -> Result<()> {
    let config = CleanConfig {
        lowercase: !keep_case,
        remove_stopwords: !keep_stopwords,
        ..Default::default()
    };
    let stats = clean_corpus(input, output, &config)
        .with_context(|| format!("failed to clean {}", input.display()))?;

    println!("Processed: {}", stats.processed);
    println!("Errors:    {}", stats.errors);
    println!("Words:     {}", stats.total_words);
    Ok(())
}

fn run_evaluate(
    corpus: &Path,
    config: &EvalConfig,
    methods: &[String],
    results_csv: Option<&Path>,
    results_json: Option<&Path>,
) -> Result<()> {
    let methods = methods
        .iter()
        .map(|name| name.parse::<Method>())
        .collect::<Result<Vec<_>, _>>()?;
    let selected = (!methods.is_empty()).then_some(methods.as_slice());

    let summary = evaluate_corpus(corpus, config, selected)
        .with_context(|| format!("failed to evaluate {}", corpus.display()))?;

    print!("{}", report::results_table(&summary.evaluation));
    println!(
        "\n{} records evaluated, {} skipped, {} methods excluded",
        summary.evaluation.records,
        summary.skipped_records,
        summary.evaluation.excluded.len()
    );

    if let Some(path) = results_csv {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        report::write_results_csv(&summary.evaluation.results, BufWriter::new(file))?;
        info!("Results written to {}", path.display());
    }
    if let Some(path) = results_json {
        fs::write(path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Results written to {}", path.display());
    }
    Ok(())
}

struct Outputs {
    html: Option<PathBuf>,
    json: Option<PathBuf>,
    csv: Option<PathBuf>,
    vocab_out: Option<PathBuf>,
}

fn run_analyze(
    corpus: &Path,
    method: &str,
    config: &EvalConfig,
    options: &AnalysisOptions,
    outputs: &Outputs,
) -> Result<()> {
    let method: Method = method.parse()?;
    let corpus =
        read_corpus(corpus).with_context(|| format!("failed to read {}", corpus.display()))?;

    let caps = Capabilities::load(config);
    let registry = Registry::build(&caps, config.language);
    let pipeline = registry.require(method)?;

    let analysis = analyze(&corpus.texts, pipeline, config.language, options)?;
    let metrics = &analysis.metrics;
    let ctx = ReportContext::now(method.name(), config.language);

    println!("Method:        {}", method);
    println!(
        "Records:       {} ({} dropped, {} failed)",
        analysis.records, analysis.dropped_records, analysis.failed_records
    );
    println!("Total tokens:  {}", metrics.total_tokens);
    println!("Vocabulary:    {}", metrics.vocab_size);
    println!("OOV:           {:.2}%", metrics.oov_percentage);
    println!("Mean length:   {:.2}", metrics.mean_token_length());
    for (rank, row) in metrics.token_freq.iter().enumerate() {
        println!("{:>3}. {:<20} {}", rank + 1, row.token, row.count);
    }

    if let Some(path) = &outputs.html {
        fs::write(path, report::render_html(metrics, &ctx))
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("HTML report saved to {}", path.display());
    }
    if let Some(path) = &outputs.json {
        let value = report::json_export(metrics, &ctx);
        fs::write(path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("JSON export saved to {}", path.display());
    }
    if let Some(path) = &outputs.csv {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        report::write_frequency_csv(metrics, BufWriter::new(file))?;
        info!("Frequency table saved to {}", path.display());
    }
    if let Some(path) = &outputs.vocab_out {
        analysis.vocabulary.save(path)?;
        info!("Vocabulary ({} tokens) saved to {}", analysis.vocabulary.len(), path.display());
    }
    Ok(())
}
