//! Search backend trait and bulk request types

use crate::index::IndexResult;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One document to (re)index under a fixed id
///
/// Always sent as an `index` operation, so an existing document with the
/// same id is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkAction {
    pub index: String,
    pub id: String,
    pub source: Map<String, Value>,
}

/// Result of one bulk action, in request order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItem {
    pub id: String,
    pub status: u16,
    pub error: Option<String>,
}

impl BulkItem {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResponse {
    pub items: Vec<BulkItem>,
}

/// A document store that can be bulk-loaded
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Whether `index` exists
    async fn index_exists(&self, index: &str) -> IndexResult<bool>;

    /// Creates `index` with the given field mapping
    async fn create_index(&self, index: &str, mapping: &Value) -> IndexResult<()>;

    /// Sends a batch of index operations
    ///
    /// An `Err` means the request as a whole failed. Failures of single
    /// documents are reported per item in the response.
    async fn bulk(&self, actions: &[BulkAction]) -> IndexResult<BulkResponse>;
}
