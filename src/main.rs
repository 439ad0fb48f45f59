//! Command-line front end for the vector store

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vecstore::{
    DistanceMetric, HnswIndex, HnswParams, Index, Metadata, MetadataFilter, MetadataPredicate,
    MetadataValue, SearchResult, Vector, VectorStore,
};

#[derive(Parser)]
#[command(name = "vecstore")]
#[command(about = "Nearest-neighbor queries over an in-memory vector store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy)]
enum IndexType {
    Flat,
    Hnsw,
}

#[derive(ValueEnum, Clone, Copy)]
enum MetricArg {
    Euclidean,
    SquaredEuclidean,
    Cosine,
    Manhattan,
}

impl From<MetricArg> for DistanceMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Euclidean => DistanceMetric::Euclidean,
            MetricArg::SquaredEuclidean => DistanceMetric::SquaredEuclidean,
            MetricArg::Cosine => DistanceMetric::Cosine,
            MetricArg::Manhattan => DistanceMetric::Manhattan,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load three sample vectors and find the one closest to [20, 30, 40]
    Demo,
    /// Load records from a JSON-lines file and run one query
    Query {
        /// File with one `{"vector": [...], "metadata": {...}}` object per line
        #[arg(short, long)]
        input: PathBuf,
        /// Query vector as comma-separated values (e.g., "1.0,2.0,3.0")
        #[arg(short, long)]
        vector: String,
        /// Number of results to return
        #[arg(short, long, default_value = "5")]
        k: usize,
        /// Distance metric
        #[arg(long, value_enum, default_value = "euclidean")]
        metric: MetricArg,
        /// Equality filter on metadata, `key=value`; may be repeated
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Auxiliary index to build while loading
        #[arg(long, value_enum, default_value = "flat")]
        index: IndexType,
    },
}

#[derive(Deserialize)]
struct InputRecord {
    vector: Vector,
    #[serde(default)]
    metadata: Metadata,
}

fn parse_filter(filters: &[String]) -> Result<Option<MetadataFilter>> {
    if filters.is_empty() {
        return Ok(None);
    }
    let mut filter = MetadataFilter::new();
    for entry in filters {
        let Some((key, raw)) = entry.split_once('=') else {
            bail!("filter must look like key=value, got {:?}", entry);
        };
        let value = if let Ok(i) = raw.parse::<i64>() {
            MetadataValue::Int(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            MetadataValue::Float(f)
        } else if let Ok(b) = raw.parse::<bool>() {
            MetadataValue::Bool(b)
        } else {
            MetadataValue::String(raw.to_string())
        };
        filter = filter.eq(key.trim(), value);
    }
    Ok(Some(filter))
}

fn load<I: Index>(store: &VectorStore<I>, input: &Path) -> Result<usize> {
    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let mut loaded = 0;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: InputRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed record", input.display(), line_no + 1))?;
        store
            .insert(record.vector, record.metadata)
            .with_context(|| format!("{}:{}: rejected record", input.display(), line_no + 1))?;
        loaded += 1;
    }
    info!(loaded, path = %input.display(), "loaded records");
    Ok(loaded)
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results found");
        return;
    }
    println!("Top {} results:", results.len());
    for (i, result) in results.iter().enumerate() {
        let metadata = serde_json::to_string(&result.metadata).unwrap_or_default();
        println!(
            "{}. id {} (distance: {:.4}) {}",
            i + 1,
            result.id,
            result.distance,
            metadata
        );
    }
}

fn run_query<I: Index>(
    store: VectorStore<I>,
    input: &Path,
    vector: &str,
    k: usize,
    metric: DistanceMetric,
    filter: Option<MetadataFilter>,
) -> Result<()> {
    load(&store, input)?;
    let query: Vector = vector.parse()?;
    let results = store.search_with(
        query.as_slice(),
        k,
        &metric,
        filter.as_ref().map(|f| f as &dyn MetadataPredicate),
    )?;
    print_results(&results);
    Ok(())
}

fn run_demo() -> Result<()> {
    let store = VectorStore::new();
    store.insert([1.0, 2.0, 3.0], Metadata::new().with("id", 1).with("name", "vector1"))?;
    store.insert([4.0, 5.0, 6.0], Metadata::new().with("id", 2).with("name", "vector2"))?;
    store.insert([7.0, 8.0, 9.0], Metadata::new().with("id", 3).with("name", "vector3"))?;

    let results = store.search(&[20.0, 30.0, 40.0], 1)?;
    print_results(&results);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo => run_demo(),
        Commands::Query {
            input,
            vector,
            k,
            metric,
            filters,
            index,
        } => {
            let metric = DistanceMetric::from(metric);
            let filter = parse_filter(&filters)?;
            match index {
                IndexType::Flat => run_query(VectorStore::new(), &input, &vector, k, metric, filter),
                IndexType::Hnsw => {
                    let store =
                        VectorStore::with_index(HnswIndex::with_params(metric, HnswParams::default()));
                    run_query(store, &input, &vector, k, metric, filter)
                }
            }
        }
    }
}
