//! In-process search index
//!
//! Keeps indexed documents in memory. Used for dry reindex runs and tests.

use crate::index::traits::{BulkAction, BulkItem, BulkResponse, SearchIndex};
use crate::index::IndexResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

type Documents = BTreeMap<String, Map<String, Value>>;

#[derive(Debug, Default)]
pub struct MemoryIndex {
    mappings: Mutex<HashMap<String, Value>>,
    indices: Mutex<HashMap<String, Documents>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document stored under `id`, if any
    pub fn get(&self, index: &str, id: &str) -> Option<Map<String, Value>> {
        self.indices()
            .get(index)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in `index`
    pub fn len(&self, index: &str) -> usize {
        self.indices().get(index).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, index: &str) -> bool {
        self.len(index) == 0
    }

    /// Mapping `index` was created with
    pub fn mapping(&self, index: &str) -> Option<Value> {
        self.mappings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    fn indices(&self) -> MutexGuard<'_, HashMap<String, Documents>> {
        self.indices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn index_exists(&self, index: &str) -> IndexResult<bool> {
        Ok(self.indices().contains_key(index))
    }

    async fn create_index(&self, index: &str, mapping: &Value) -> IndexResult<()> {
        self.mappings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(index.to_string(), mapping.clone());
        self.indices().entry(index.to_string()).or_default();
        Ok(())
    }

    async fn bulk(&self, actions: &[BulkAction]) -> IndexResult<BulkResponse> {
        let mut indices = self.indices();

        let items = actions
            .iter()
            .map(|action| {
                let docs = indices.entry(action.index.clone()).or_default();
                let status = match docs.insert(action.id.clone(), action.source.clone()) {
                    Some(_) => 200,
                    None => 201,
                };
                BulkItem {
                    id: action.id.clone(),
                    status,
                    error: None,
                }
            })
            .collect();

        Ok(BulkResponse { items })
    }
}
