//! Storage traits and error types
//!
//! This module defines the trait interface for listing stores and
//! associated error types.

use crate::record::{CanonicalRecord, StoredRecord};
use crate::storage::{RunRecord, RunStatus, RunSummary, UpsertStats};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid timestamp '{0}' in database")]
    InvalidTimestamp(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent listing collection keyed by URL
pub trait ListingStore {
    // ===== Listings =====

    /// Inserts new listings and replaces existing ones, keyed by `url`
    ///
    /// Runs in a single transaction. Records with an empty url are skipped.
    /// When a batch holds the same url twice, the later record wins.
    fn upsert_all(&mut self, records: &[CanonicalRecord]) -> StorageResult<UpsertStats>;

    /// Gets a listing by URL
    fn get(&self, url: &str) -> StorageResult<Option<StoredRecord>>;

    /// Loads every listing in insertion order
    fn load_all(&self) -> StorageResult<Vec<StoredRecord>>;

    /// Counts stored listings
    fn count(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new crawl run in the `Running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, site: &str, config_hash: &str) -> StorageResult<i64>;

    /// Finishes a run with its final status and counters
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;
}
