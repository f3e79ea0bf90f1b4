//! Immo-Ripple main entry point
//!
//! This is the command-line interface for the Immo-Ripple listing harvester.

use anyhow::Context;
use clap::Parser;
use immo_ripple::config::{load_config_with_hash, Config};
use immo_ripple::crawler::{crawl, Coordinator};
use immo_ripple::index::{ElasticsearchIndex, Reindexer};
use immo_ripple::output::{
    format_dry_run, format_reindex_report, load_statistics, print_run_report, print_statistics,
};
use immo_ripple::snapshot::{read_snapshot, write_snapshot};
use immo_ripple::storage::{open_store, ListingStore};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Immo-Ripple: a polite real-estate listing harvester
///
/// Immo-Ripple walks the list pages of a listing site, extracts every linked
/// detail page into a canonical record, and upserts the records into a local
/// store keyed by listing URL. Stored listings can be exported as a JSONL
/// snapshot and bulk-loaded into a search index.
#[derive(Parser, Debug)]
#[command(name = "immo-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A polite real-estate listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the number of list pages to walk
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pages: Option<u32>,

    /// Crawl and print the records without touching the store
    #[arg(long, conflicts_with_all = ["stats", "export_snapshot", "reindex"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_snapshot", "reindex"])]
    stats: bool,

    /// Write every stored listing to the snapshot file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "reindex"])]
    export_snapshot: bool,

    /// Load stored listings into the search index and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export_snapshot"])]
    reindex: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(pages) = cli.pages {
        config.crawler.pages = pages;
    }

    if cli.dry_run {
        handle_dry_run(&config).await
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.export_snapshot {
        handle_export_snapshot(&config)
    } else if cli.reindex {
        handle_reindex(&config).await
    } else {
        handle_crawl(&config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("immo_ripple=info,warn"),
            1 => EnvFilter::new("immo_ripple=debug,info"),
            2 => EnvFilter::new("immo_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn handle_crawl(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    let mut store = open_store(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open {}", config.output.database_path))?;

    let report = crawl(config, config_hash, &mut store)
        .await
        .context("crawl failed")?;

    print_run_report(&report);
    Ok(())
}

/// Handles the --dry-run mode: crawls without a store
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::from_config(config)?;
    let outcome = coordinator.run().await.context("crawl failed")?;

    print!("{}", format_dry_run(coordinator.site(), &outcome));
    Ok(())
}

fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_store(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open {}", config.output.database_path))?;
    let stats = load_statistics(&store)?;

    print_statistics(&stats);
    Ok(())
}

fn handle_export_snapshot(config: &Config) -> anyhow::Result<()> {
    let store = open_store(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open {}", config.output.database_path))?;
    let listings = store.load_all()?;

    let written = write_snapshot(Path::new(&config.output.snapshot_path), &listings)?;
    println!(
        "✓ Exported {} listings to: {}",
        written, config.output.snapshot_path
    );
    Ok(())
}

/// Handles the --reindex mode: snapshot file if present, else the store
async fn handle_reindex(config: &Config) -> anyhow::Result<()> {
    let documents = load_documents(config)?;

    let backend = ElasticsearchIndex::from_config(&config.index)?;
    let reindexer = Reindexer::new(backend, config.index.name.as_str(), config.index.batch_size);

    reindexer.ensure_index().await?;

    let report = reindexer
        .reindex(documents)
        .await
        .with_context(|| format!("reindexing into {} failed", config.index.url))?;

    print!("{}", format_reindex_report(&config.index.name, &report));
    Ok(())
}

fn load_documents(config: &Config) -> anyhow::Result<Vec<Map<String, Value>>> {
    let snapshot = Path::new(&config.output.snapshot_path);
    if snapshot.exists() {
        tracing::info!("Reading documents from {}", snapshot.display());
        return Ok(read_snapshot(snapshot)?);
    }

    tracing::info!(
        "No snapshot at {}, reading the store",
        snapshot.display()
    );
    let store = open_store(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open {}", config.output.database_path))?;

    let documents = store
        .load_all()?
        .iter()
        .map(|listing| listing.to_document())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(documents)
}
