//! Crawler module for listing harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with an identifying user agent
//! - Aggregate rate limiting with randomized delays
//! - List-page walking and bounded concurrent detail processing
//! - Persisting a run's records into the listing store

mod coordinator;
mod fetcher;
mod limiter;

pub use coordinator::{Coordinator, CrawlOutcome, SkippedUrl, VisitedUrls};
pub use fetcher::{build_http_client, FetchError, Fetcher};
pub use limiter::RateLimiter;

use crate::config::Config;
use crate::storage::{ListingStore, RunStatus, RunSummary, UpsertStats};
use crate::ImmoError;

/// What one crawl run did
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: i64,
    pub site: String,
    pub list_pages_fetched: u32,
    pub records: u64,
    pub skipped: Vec<SkippedUrl>,
    pub stats: UpsertStats,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            records: self.records,
            skipped: self.skipped.len() as u64,
            stats: self.stats,
        }
    }
}

/// Runs a complete crawl and stores its records
///
/// This is the main entry point for a crawl. It will:
/// 1. Record a new run in the store
/// 2. Walk the list pages and process detail pages
/// 3. Upsert all records of the run in one batch
/// 4. Mark the run completed (or failed) with its counters
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, recorded on the run
/// * `store` - The listing store to write into
pub async fn crawl<S: ListingStore>(
    config: &Config,
    config_hash: &str,
    store: &mut S,
) -> Result<RunReport, ImmoError> {
    let coordinator = Coordinator::from_config(config)?;
    let run_id = store.create_run(coordinator.site(), config_hash)?;

    let outcome = match coordinator.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            store.finish_run(run_id, RunStatus::Failed, &RunSummary::default())?;
            return Err(e);
        }
    };

    let stats = match store.upsert_all(&outcome.records) {
        Ok(stats) => stats,
        Err(e) => {
            let summary = RunSummary {
                records: outcome.records.len() as u64,
                skipped: outcome.skipped.len() as u64,
                stats: UpsertStats::default(),
            };
            if let Err(finish) = store.finish_run(run_id, RunStatus::Failed, &summary) {
                tracing::error!("Could not mark run {} as failed: {}", run_id, finish);
            }
            return Err(e.into());
        }
    };

    let report = RunReport {
        run_id,
        site: coordinator.site().to_string(),
        list_pages_fetched: outcome.list_pages_fetched,
        records: outcome.records.len() as u64,
        skipped: outcome.skipped,
        stats,
    };

    store.finish_run(run_id, RunStatus::Completed, &report.summary())?;

    tracing::info!(
        "Run {} completed: {} upserted, {} matched, {} modified",
        run_id,
        stats.upserted,
        stats.matched,
        stats.modified
    );

    Ok(report)
}
