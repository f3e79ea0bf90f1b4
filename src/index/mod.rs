//! Search index population
//!
//! This module handles:
//! - The `SearchIndex` backend trait (Elasticsearch over HTTP, or in memory)
//! - The index field mapping
//! - Numeric projection of text fields for range queries
//! - Batched reindexing from the store or a snapshot

mod elasticsearch;
mod mapping;
mod memory;
pub mod numeric;
mod reindex;
mod traits;

pub use elasticsearch::ElasticsearchIndex;
pub use mapping::listing_mapping;
pub use memory::MemoryIndex;
pub use reindex::{prepare_document, FailedDocument, ReindexReport, Reindexer};
pub use traits::{BulkAction, BulkItem, BulkResponse, SearchIndex};

use thiserror::Error;

/// Errors from talking to a search backend
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Search backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid search backend URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected search backend response: {0}")]
    UnexpectedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for search index operations
pub type IndexResult<T> = Result<T, IndexError>;
