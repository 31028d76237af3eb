use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use forkdex_core::persist::{save_snapshot, IndexPaths};
use forkdex_core::{build_pipeline, load_corpus, IdfScheme, IndexConfig, RestaurantPayload, SearchEngine, SearchMode, VocabularyStrategy};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::Path;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the restaurant TF-IDF inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Admit every distinct term (boolean engine)
    DocFrequency,
    /// Admit terms whose total occurrence count lies in [min, max] (ranked engine)
    Occurrence,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Boolean,
    Ranked,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Vocabulary admission policy
        #[arg(long, value_enum, default_value_t = Strategy::Occurrence)]
        strategy: Strategy,
        #[arg(long, default_value_t = VocabularyStrategy::DEFAULT_MIN_FREQUENCY)]
        min_frequency: u32,
        #[arg(long, default_value_t = VocabularyStrategy::DEFAULT_MAX_FREQUENCY)]
        max_frequency: u32,
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
    },
    /// Run a query against a built index and print the results as JSON
    Query {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: String,
        #[arg(long, value_enum, default_value_t = Mode::Ranked)]
        mode: Mode,
        /// Number of results in ranked mode
        #[arg(long, default_value_t = 5)]
        k: usize,
        /// Free-text query
        text: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, strategy, min_frequency, max_frequency, smoothed_idf } => {
            let strategy = match strategy {
                Strategy::DocFrequency => VocabularyStrategy::DocFrequencyUnfiltered,
                Strategy::Occurrence => VocabularyStrategy::occurrence_filtered(min_frequency, max_frequency)?,
            };
            let idf = if smoothed_idf { IdfScheme::Smoothed } else { IdfScheme::Standard };
            build_index(&input, &output, IndexConfig { strategy, idf })
        }
        Commands::Query { index, mode, k, text } => {
            let mode = match mode {
                Mode::Boolean => SearchMode::Boolean,
                Mode::Ranked => SearchMode::Ranked { k },
            };
            run_query(&index, &text, mode)
        }
    }
}

fn build_index(input: &str, output: &str, config: IndexConfig) -> Result<()> {
    let corpus = load_corpus(Path::new(input)).with_context(|| format!("reading corpus from {input}"))?;
    let built = build_pipeline(corpus.documents(), config)?;
    let payloads: Vec<RestaurantPayload> = corpus.into_documents().into_iter().map(|d| d.payload).collect();
    let meta = save_snapshot(&IndexPaths::new(output), &built, &payloads)
        .with_context(|| format!("writing index to {output}"))?;
    tracing::info!(output, num_docs = meta.num_docs, num_terms = meta.num_terms, "index written");
    Ok(())
}

fn run_query(index: &str, text: &str, mode: SearchMode) -> Result<()> {
    let engine = SearchEngine::open(index).with_context(|| format!("opening index {index}"))?;
    let results = engine.search(text, mode)?;
    tracing::debug!(hits = results.hits().len(), "query complete");
    println!("{}", serde_json::to_string_pretty(results.hits())?);
    Ok(())
}
