//! Storage module for persisting listings
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent listing upserts keyed by URL
//! - Run tracking with per-run counters

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{ListingStore, StorageError, StorageResult};

use std::path::Path;

/// Opens (or creates) the listing database at `path`
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// Outcome counters of one `upsert_all` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    /// Records whose url was already stored
    pub matched: u64,
    /// Records inserted as new listings
    pub upserted: u64,
    /// Matched records whose canonical document changed
    pub modified: u64,
}

/// Counters recorded when a run finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: u64,
    pub skipped: u64,
    pub stats: UpsertStats,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub site: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub summary: RunSummary,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
