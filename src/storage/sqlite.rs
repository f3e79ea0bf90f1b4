//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ListingStore trait.

use crate::record::{CanonicalRecord, StoredRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ListingStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, RunSummary, UpsertStats};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::path::Path;

/// SQLite listing store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Upserts with an explicit clock reading
    ///
    /// Every record of the batch gets the same `scraped_at`.
    pub fn upsert_all_at(
        &mut self,
        records: &[CanonicalRecord],
        now: DateTime<Utc>,
    ) -> StorageResult<UpsertStats> {
        let mut stats = UpsertStats::default();

        if records.is_empty() {
            return Ok(stats);
        }

        let now = now.to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut select = tx.prepare("SELECT document FROM listings WHERE url = ?1")?;
            let mut insert = tx.prepare(
                "INSERT INTO listings (url, document, first_seen_at, scraped_at) VALUES (?1, ?2, ?3, ?3)",
            )?;
            let mut update =
                tx.prepare("UPDATE listings SET document = ?2, scraped_at = ?3 WHERE url = ?1")?;

            for record in records {
                if record.url.trim().is_empty() {
                    tracing::warn!("Skipping record without url");
                    continue;
                }

                let document = serde_json::to_value(record)?;
                let previous: Option<String> = select
                    .query_row(params![record.url], |row| row.get(0))
                    .optional()?;

                match previous {
                    None => {
                        insert.execute(params![record.url, document.to_string(), now])?;
                        stats.upserted += 1;
                    }
                    Some(previous) => {
                        update.execute(params![record.url, document.to_string(), now])?;
                        stats.matched += 1;

                        // Unreadable old documents count as changed
                        let unchanged = serde_json::from_str::<Value>(&previous)
                            .map(|old| old == document)
                            .unwrap_or(false);
                        if !unchanged {
                            stats.modified += 1;
                        }
                    }
                }
            }
        }

        tx.commit()?;

        tracing::debug!(
            "Upserted batch of {}: {} new, {} matched, {} modified",
            records.len(),
            stats.upserted,
            stats.matched,
            stats.modified
        );

        Ok(stats)
    }
}

impl ListingStore for SqliteStore {
    // ===== Listings =====

    fn upsert_all(&mut self, records: &[CanonicalRecord]) -> StorageResult<UpsertStats> {
        self.upsert_all_at(records, Utc::now())
    }

    fn get(&self, url: &str) -> StorageResult<Option<StoredRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, document, first_seen_at, scraped_at FROM listings WHERE url = ?1",
        )?;

        let row = stmt.query_row(params![url], read_listing_row).optional()?;
        row.map(stored_record).transpose()
    }

    fn load_all(&self) -> StorageResult<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, document, first_seen_at, scraped_at FROM listings ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], read_listing_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(stored_record).collect()
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Run Management =====

    fn create_run(&mut self, site: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (site, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![site, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, records = ?3, skipped = ?4,
                matched = ?5, upserted = ?6, modified = ?7
             WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                summary.records as i64,
                summary.skipped as i64,
                summary.stats.matched as i64,
                summary.stats.upserted as i64,
                summary.stats.modified as i64,
                run_id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self.conn.prepare(&format!("{} WHERE id = ?1", RUN_SELECT))?;

        stmt.query_row(params![run_id], read_run_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id DESC LIMIT 1", RUN_SELECT))?;

        Ok(stmt.query_row([], read_run_row).optional()?)
    }
}

const RUN_SELECT: &str = "SELECT id, site, started_at, finished_at, config_hash, status,
    records, skipped, matched, upserted, modified FROM runs";

struct ListingRow {
    id: i64,
    document: String,
    first_seen_at: String,
    scraped_at: String,
}

fn read_listing_row(row: &Row<'_>) -> rusqlite::Result<ListingRow> {
    Ok(ListingRow {
        id: row.get(0)?,
        document: row.get(1)?,
        first_seen_at: row.get(2)?,
        scraped_at: row.get(3)?,
    })
}

fn stored_record(row: ListingRow) -> StorageResult<StoredRecord> {
    Ok(StoredRecord {
        id: row.id,
        record: serde_json::from_str(&row.document)?,
        first_seen_at: parse_timestamp(&row.first_seen_at)?,
        scraped_at: parse_timestamp(&row.scraped_at)?,
    })
}

fn read_run_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        site: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Running),
        summary: RunSummary {
            records: row.get::<_, i64>(6)? as u64,
            skipped: row.get::<_, i64>(7)? as u64,
            stats: UpsertStats {
                matched: row.get::<_, i64>(8)? as u64,
                upserted: row.get::<_, i64>(9)? as u64,
                modified: row.get::<_, i64>(10)? as u64,
            },
        },
    })
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidTimestamp(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn listing(url: &str, titel: &str) -> CanonicalRecord {
        let mut record = CanonicalRecord::empty(url);
        record.titel = Some(titel.to_string());
        record
    }

    #[test]
    fn test_create_in_memory() {
        let store = SqliteStore::new_in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_empty_upsert() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let stats = store.upsert_all(&[]).unwrap();
        assert_eq!(stats, UpsertStats::default());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let records = vec![
            listing("https://example.com/1", "A"),
            listing("https://example.com/2", "B"),
        ];

        let first_at = Utc::now() - Duration::hours(1);
        let first = store.upsert_all_at(&records, first_at).unwrap();
        assert_eq!(first.upserted, 2);
        assert_eq!(first.matched, 0);

        let second_at = Utc::now();
        let second = store.upsert_all_at(&records, second_at).unwrap();
        assert_eq!(second.upserted, 0);
        assert_eq!(second.matched, 2);
        assert_eq!(second.modified, 0);

        assert_eq!(store.count().unwrap(), 2);

        let stored = store.get("https://example.com/1").unwrap().unwrap();
        assert_eq!(stored.first_seen_at.timestamp(), first_at.timestamp());
        assert_eq!(stored.scraped_at.timestamp(), second_at.timestamp());
    }

    #[test]
    fn test_changed_document_counts_as_modified() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .upsert_all(&[listing("https://example.com/1", "A")])
            .unwrap();

        let stats = store
            .upsert_all(&[listing("https://example.com/1", "A (reduziert)")])
            .unwrap();
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.modified, 1);

        let stored = store.get("https://example.com/1").unwrap().unwrap();
        assert_eq!(stored.record.titel.as_deref(), Some("A (reduziert)"));
    }

    #[test]
    fn test_duplicate_url_in_batch_keeps_later() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let stats = store
            .upsert_all(&[
                listing("https://example.com/1", "first"),
                listing("https://example.com/1", "second"),
            ])
            .unwrap();

        assert_eq!(stats.upserted, 1);
        assert_eq!(stats.matched, 1);
        assert_eq!(store.count().unwrap(), 1);

        let stored = store.get("https://example.com/1").unwrap().unwrap();
        assert_eq!(stored.record.titel.as_deref(), Some("second"));
    }

    #[test]
    fn test_empty_url_is_skipped() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let stats = store
            .upsert_all(&[listing("", "no url"), listing("https://example.com/1", "A")])
            .unwrap();

        assert_eq!(stats.upserted, 1);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_load_all_roundtrips_details() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let mut record = listing("https://example.com/1", "A");
        record.balkon = true;
        record
            .details
            .insert("stockwerk".to_string(), Value::String("2. Stock".to_string()));

        store.upsert_all(&[record.clone()]).unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].record, record);
    }

    #[test]
    fn test_get_missing() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.get("https://example.com/none").unwrap().is_none());
    }

    #[test]
    fn test_run_lifecycle() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        assert!(store.get_latest_run().unwrap().is_none());

        let run_id = store.create_run("willhaben", "test_hash").unwrap();
        assert!(run_id > 0);

        let summary = RunSummary {
            records: 3,
            skipped: 1,
            stats: UpsertStats {
                matched: 0,
                upserted: 3,
                modified: 0,
            },
        };
        store
            .finish_run(run_id, RunStatus::Completed, &summary)
            .unwrap();

        let run = store.get_latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.site, "willhaben");
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.finished_at.is_some());
        assert_eq!(run.summary, summary);
    }

    #[test]
    fn test_finish_unknown_run() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let result = store.finish_run(42, RunStatus::Failed, &RunSummary::default());
        assert!(matches!(result, Err(StorageError::RunNotFound(42))));
        assert!(matches!(store.get_run(42), Err(StorageError::RunNotFound(42))));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("immo.db");

        {
            let mut store = SqliteStore::new(&path).unwrap();
            store
                .upsert_all(&[listing("https://example.com/1", "A")])
                .unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
