//! Statistics generation from the listing store
//!
//! This module provides functionality for summarizing stored listings
//! and the most recent crawl run.

use crate::record::BOOLEAN_FLAGS;
use crate::storage::{ListingStore, RunRecord, StorageResult};

/// Listing store summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Total number of stored listings
    pub total_listings: u64,

    /// Listings with each canonical flag set, in schema order
    pub flag_counts: Vec<(&'static str, u64)>,

    /// Listings without a price
    pub missing_price: u64,

    /// The most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from a listing store
pub fn load_statistics<S: ListingStore>(store: &S) -> StorageResult<StoreStatistics> {
    let listings = store.load_all()?;

    let mut flag_counts: Vec<(&'static str, u64)> =
        BOOLEAN_FLAGS.iter().map(|name| (*name, 0)).collect();
    let mut missing_price = 0;

    for listing in &listings {
        for (slot, (_, set)) in flag_counts.iter_mut().zip(listing.record.flags()) {
            if set {
                slot.1 += 1;
            }
        }
        if listing.record.preis.is_none() {
            missing_price += 1;
        }
    }

    Ok(StoreStatistics {
        total_listings: listings.len() as u64,
        flag_counts,
        missing_price,
        latest_run: store.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Listing Statistics ===\n");

    println!("Overview:");
    println!("  Total listings: {}", stats.total_listings);
    println!("  Without price: {}", stats.missing_price);
    println!();

    println!("Features:");
    for (name, count) in &stats.flag_counts {
        let percentage = if stats.total_listings > 0 {
            (*count as f64 / stats.total_listings as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", name, count, percentage);
    }
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  ID: {} ({})", run.id, run.site);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!(
                "  Records: {}, skipped: {}",
                run.summary.records, run.summary.skipped
            );
            println!(
                "  Upserted: {}, matched: {}, modified: {}",
                run.summary.stats.upserted, run.summary.stats.matched, run.summary.stats.modified
            );
        }
        None => println!("No crawl runs recorded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CanonicalRecord;
    use crate::storage::{RunStatus, RunSummary, SqliteStore};

    #[test]
    fn test_statistics_empty_store() {
        let store = SqliteStore::new_in_memory().unwrap();
        let stats = load_statistics(&store).unwrap();

        assert_eq!(stats.total_listings, 0);
        assert_eq!(stats.missing_price, 0);
        assert!(stats.flag_counts.iter().all(|(_, count)| *count == 0));
        assert!(stats.latest_run.is_none());
    }

    #[test]
    fn test_statistics_counts_flags() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        let mut first = CanonicalRecord::empty("https://example.com/1");
        first.balkon = true;
        first.preis = Some("€ 900".to_string());
        let mut second = CanonicalRecord::empty("https://example.com/2");
        second.balkon = true;
        second.keller = true;

        let run_id = store.create_run("willhaben", "abc").unwrap();
        let stats = store.upsert_all(&[first, second]).unwrap();
        store
            .finish_run(
                run_id,
                RunStatus::Completed,
                &RunSummary {
                    records: 2,
                    skipped: 0,
                    stats,
                },
            )
            .unwrap();

        let stats = load_statistics(&store).unwrap();
        assert_eq!(stats.total_listings, 2);
        assert_eq!(stats.missing_price, 1);
        assert_eq!(stats.flag_counts[0], ("balkon", 2));
        assert_eq!(stats.flag_counts[7], ("keller", 1));

        let run = stats.latest_run.unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.summary.stats.upserted, 2);
    }
}
