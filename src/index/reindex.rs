//! Batched reindexing
//!
//! Turns stored or snapshotted listing documents into bulk index actions keyed
//! by listing URL. Reindexing the same URL replaces the earlier document.

use crate::index::mapping::listing_mapping;
use crate::index::numeric::project;
use crate::index::traits::{BulkAction, SearchIndex};
use crate::index::{IndexError, IndexResult};
use crate::normalize::truthy_json;
use crate::record::{BOOLEAN_FLAGS, EXTRA_FLAGS};
use serde_json::{Map, Value};

/// A document the backend refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDocument {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexReport {
    pub indexed: usize,
    pub skipped_without_url: usize,
    pub failed: Vec<FailedDocument>,
}

/// Loads listing documents into one index of a search backend
pub struct Reindexer<I: SearchIndex> {
    backend: I,
    index: String,
    batch_size: usize,
}

impl<I: SearchIndex> Reindexer<I> {
    pub fn new(backend: I, index: impl Into<String>, batch_size: usize) -> Self {
        Self {
            backend,
            index: index.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn backend(&self) -> &I {
        &self.backend
    }

    /// Creates the index with the listing mapping unless it exists
    ///
    /// Returns whether the index was created.
    pub async fn ensure_index(&self) -> IndexResult<bool> {
        if self.backend.index_exists(&self.index).await? {
            tracing::debug!("Index {} already exists", self.index);
            return Ok(false);
        }

        self.backend
            .create_index(&self.index, &listing_mapping())
            .await?;
        Ok(true)
    }

    /// Indexes every document that has a url
    ///
    /// Documents go out in batches of `batch_size`. Per-document failures
    /// and every document of a batch the backend rejected with an HTTP
    /// error are collected in the report. Transport errors abort the run.
    pub async fn reindex(&self, documents: Vec<Map<String, Value>>) -> IndexResult<ReindexReport> {
        let mut report = ReindexReport::default();
        let mut actions = Vec::with_capacity(documents.len());

        for doc in documents {
            match prepare_document(doc) {
                Some((id, source)) => actions.push(BulkAction {
                    index: self.index.clone(),
                    id,
                    source,
                }),
                None => report.skipped_without_url += 1,
            }
        }

        if report.skipped_without_url > 0 {
            tracing::warn!(
                "Skipped {} documents without url",
                report.skipped_without_url
            );
        }

        for (batch_no, batch) in actions.chunks(self.batch_size).enumerate() {
            let response = match self.backend.bulk(batch).await {
                Ok(response) => response,
                Err(IndexError::Status { status, body }) => {
                    let reason = format!("HTTP {}: {}", status, body);
                    tracing::warn!(
                        "Batch {} rejected ({}), {} documents failed",
                        batch_no + 1,
                        reason,
                        batch.len()
                    );
                    report
                        .failed
                        .extend(batch.iter().map(|action| FailedDocument {
                            id: action.id.clone(),
                            reason: reason.clone(),
                        }));
                    continue;
                }
                Err(e) => return Err(e),
            };

            for item in response.items {
                if item.is_success() {
                    report.indexed += 1;
                } else {
                    let reason = item
                        .error
                        .unwrap_or_else(|| format!("HTTP {}", item.status));
                    tracing::warn!("Failed to index {}: {}", item.id, reason);
                    report.failed.push(FailedDocument {
                        id: item.id,
                        reason,
                    });
                }
            }

            tracing::debug!("Sent batch {} ({} documents)", batch_no + 1, batch.len());
        }

        tracing::info!(
            "Indexed {} documents into {} ({} failed)",
            report.indexed,
            self.index,
            report.failed.len()
        );

        Ok(report)
    }
}

/// Prepares one document for indexing
///
/// Drops the `_id` key, coerces the boolean flags, and applies the numeric
/// projection. Returns the document id (its url) and source, or `None` when
/// the document has no url.
pub fn prepare_document(mut doc: Map<String, Value>) -> Option<(String, Map<String, Value>)> {
    doc.remove("_id");

    let url = doc
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|u| !u.is_empty())?
        .to_string();

    for flag in BOOLEAN_FLAGS {
        let value = doc.get(flag).map(truthy_json).unwrap_or(false);
        doc.insert(flag.to_string(), Value::Bool(value));
    }
    for flag in EXTRA_FLAGS {
        if let Some(value) = doc.get(flag).map(truthy_json) {
            doc.insert(flag.to_string(), Value::Bool(value));
        }
    }

    project(&mut doc);

    Some((url, doc))
}
