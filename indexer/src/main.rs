mod corpus;

use anyhow::{bail, Result};
use boolsearch_core::persist::{load_index, read_header, save_index};
use boolsearch_core::query::render;
use boolsearch_core::{
    to_postfix, AnalyzerConfig, Evaluator, FrequencyMap, Identity, IndexBuilder, InvertedIndex, Language, Normalizer,
    SnowballAnalyzer, ZipfFit,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build boolean indexes, compute Zipf statistics and run boolean queries", long_about = None)]
struct Cli {
    /// Stemming language used for raw text and query operands
    #[arg(long, value_enum, default_value_t = Lang::Russian, global = true)]
    language: Lang,
    /// Drop tokens shorter than this many characters
    #[arg(long, default_value_t = 1, global = true)]
    min_token_len: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Lang {
    Russian,
    English,
}

impl From<Lang> for Language {
    fn from(l: Lang) -> Self {
        match l {
            Lang::Russian => Language::Russian,
            Lang::English => Language::English,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the inverted index from JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index file
        #[arg(long, default_value = "./index.bin")]
        output: PathBuf,
        /// Build shards on all cores and merge them
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Rank stems by corpus frequency and emit (term, frequency, rank, product) records
    Zipf {
        #[arg(long)]
        input: PathBuf,
        /// JSON Lines output; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also fit the Zipf exponent over the top K ranks
        #[arg(long)]
        fit: Option<usize>,
    },
    /// Evaluate a boolean query against a persisted index
    Search {
        #[arg(long, default_value = "./index.bin")]
        index: PathBuf,
        /// Boolean expression, e.g. "наука AND (техника OR NOT история)"
        query: String,
        /// Look operands up verbatim instead of stemming them
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    /// Print the persisted index header
    Info {
        #[arg(long, default_value = "./index.bin")]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let analyzer = SnowballAnalyzer::new(AnalyzerConfig { language: cli.language.into(), min_token_len: cli.min_token_len });

    match cli.command {
        Commands::Build { input, output, parallel } => build_index(&input, &output, parallel, &analyzer),
        Commands::Zipf { input, output, fit } => zipf(&input, output.as_deref(), fit, &analyzer),
        Commands::Search { index, query, raw } => {
            let normalizer: &dyn Normalizer = if raw { &Identity } else { &analyzer };
            run_search(&index, &query, normalizer)
        }
        Commands::Info { index } => {
            let header = read_header(&index)?;
            println!(
                "created_at={} version={} docs={} terms={}",
                header.created_at, header.version, header.num_docs, header.num_terms
            );
            Ok(())
        }
    }
}

fn build_index(input: &Path, output: &Path, parallel: bool, analyzer: &SnowballAnalyzer) -> Result<()> {
    let docs = corpus::read_corpus(input, analyzer)?;
    if docs.is_empty() {
        bail!("no documents found under {}", input.display());
    }
    let index = if parallel { IndexBuilder::build_parallel(&docs) } else { InvertedIndex::build(&docs) };
    save_index(&index, output)?;
    tracing::info!(output = %output.display(), num_terms = index.num_terms(), num_docs = index.num_docs(), "index build complete");
    Ok(())
}

fn zipf(input: &Path, output: Option<&Path>, fit: Option<usize>, analyzer: &SnowballAnalyzer) -> Result<()> {
    let docs = corpus::read_corpus(input, analyzer)?;
    let mut freq = FrequencyMap::new();
    for doc in &docs {
        freq.add(&doc.stems);
    }
    let records = freq.ranked();
    tracing::info!(distinct = records.len(), total = freq.total(), "frequencies ranked");

    let mut out: Box<dyn Write> = match output {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for r in &records {
        serde_json::to_writer(&mut out, r)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    if let Some(top_k) = fit {
        let fit = ZipfFit::estimate(&records, top_k);
        tracing::info!(alpha = fit.alpha, points = fit.points, "zipf fit");
        eprintln!("{}", serde_json::to_string(&fit)?);
    }
    Ok(())
}

fn run_search(index_path: &Path, query: &str, normalizer: &dyn Normalizer) -> Result<()> {
    let index = load_index(index_path)?;
    let start = std::time::Instant::now();
    let postfix = to_postfix(query)?;
    let ids = Evaluator::new(&index, normalizer).evaluate(&postfix)?;
    let elapsed = start.elapsed();

    println!("postfix: {}", render(&postfix));
    println!("found {} documents in {:.4}s", ids.len(), elapsed.as_secs_f64());
    let shown: Vec<String> = ids.iter().take(20).map(|id| id.to_string()).collect();
    if !shown.is_empty() {
        println!("{}", shown.join(" "));
    }
    if ids.len() > 20 {
        println!("... and {} more", ids.len() - 20);
    }
    Ok(())
}
