//! Output module for run reports and store statistics
//!
//! This module handles:
//! - Rendering what a crawl run did (records, skipped URLs, upsert counters)
//! - Rendering reindex results
//! - Summarizing the contents of the listing store

pub mod stats;

pub use stats::{load_statistics, print_statistics, StoreStatistics};

use crate::crawler::{CrawlOutcome, RunReport, SkippedUrl};
use crate::index::ReindexReport;
use std::fmt::Write;

/// Renders a finished crawl run as plain text
pub fn format_run_report(report: &RunReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Run {} ({}) ===\n", report.run_id, report.site);
    let _ = writeln!(out, "List pages fetched: {}", report.list_pages_fetched);
    let _ = writeln!(out, "Records extracted:  {}", report.records);
    let _ = writeln!(out, "Skipped URLs:       {}", report.skipped.len());
    let _ = writeln!(out);
    let _ = writeln!(out, "Store:");
    let _ = writeln!(out, "  Matched:  {}", report.stats.matched);
    let _ = writeln!(out, "  Upserted: {}", report.stats.upserted);
    let _ = writeln!(out, "  Modified: {}", report.stats.modified);

    write_skipped(&mut out, &report.skipped);
    out
}

/// Renders the outcome of a crawl that was not persisted
pub fn format_dry_run(site: &str, outcome: &CrawlOutcome) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Dry Run ({}) ===\n", site);
    let _ = writeln!(out, "List pages fetched: {}", outcome.list_pages_fetched);
    let _ = writeln!(out, "Records extracted:  {}", outcome.records.len());
    let _ = writeln!(out, "Skipped URLs:       {}", outcome.skipped.len());

    if !outcome.records.is_empty() {
        let _ = writeln!(out, "\nRecords:");
        for record in &outcome.records {
            let _ = writeln!(
                out,
                "  - {} | {} | {}",
                record.url,
                record.titel.as_deref().unwrap_or("-"),
                record.preis.as_deref().unwrap_or("-")
            );
        }
    }

    write_skipped(&mut out, &outcome.skipped);
    out
}

pub fn format_reindex_report(index: &str, report: &ReindexReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Reindex {} ===\n", index);
    let _ = writeln!(out, "Indexed:             {}", report.indexed);
    let _ = writeln!(out, "Skipped without url: {}", report.skipped_without_url);
    let _ = writeln!(out, "Failed:              {}", report.failed.len());

    if !report.failed.is_empty() {
        let _ = writeln!(out, "\nFailed documents:");
        for failed in &report.failed {
            let _ = writeln!(out, "  - {}: {}", failed.id, failed.reason);
        }
    }

    out
}

pub fn print_run_report(report: &RunReport) {
    print!("{}", format_run_report(report));
}

fn write_skipped(out: &mut String, skipped: &[SkippedUrl]) {
    if skipped.is_empty() {
        return;
    }

    let _ = writeln!(out, "\nSkipped:");
    for entry in skipped {
        let _ = writeln!(out, "  - {}: {}", entry.url, entry.reason);
    }
}
