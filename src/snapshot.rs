//! JSONL snapshots of the listing store
//!
//! One JSON object per line: the canonical fields plus `first_seen_at` and
//! `scraped_at`. Snapshots are read back as plain JSON objects, since files
//! written by older exports may carry extra keys such as `_id`.

use crate::record::StoredRecord;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed snapshot line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Snapshot line {line} is not a JSON object")]
    NotAnObject { line: usize },

    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Writes one line per stored record, replacing any existing file
///
/// Returns the number of lines written.
pub fn write_snapshot(path: &Path, records: &[StoredRecord]) -> Result<usize, SnapshotError> {
    let io_err = |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);

    for record in records {
        let line = serde_json::to_string(&record.to_document()?)?;
        writeln!(writer, "{}", line).map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;

    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(records.len())
}

/// Reads every document of a snapshot file
///
/// Blank lines are ignored. Line numbers in errors are 1-based.
pub fn read_snapshot(path: &Path) -> Result<Vec<Map<String, Value>>, SnapshotError> {
    let io_err = |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(io_err)?);
    let mut documents = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }

        let number = index + 1;
        match serde_json::from_str::<Value>(&line) {
            Ok(Value::Object(doc)) => documents.push(doc),
            Ok(_) => return Err(SnapshotError::NotAnObject { line: number }),
            Err(source) => {
                return Err(SnapshotError::Parse {
                    line: number,
                    source,
                })
            }
        }
    }

    tracing::debug!("Read {} documents from {}", documents.len(), path.display());
    Ok(documents)
}
