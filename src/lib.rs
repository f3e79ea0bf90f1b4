//! Immo-Ripple: a polite real-estate listing harvester
//!
//! This crate crawls listing sites, extracts structured attributes from their
//! detail pages, normalizes them into one canonical record shape, upserts them
//! into a SQLite store keyed by listing URL and bulk-loads them into a search
//! index on demand.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod index;
pub mod normalize;
pub mod output;
pub mod record;
pub mod sites;
pub mod snapshot;
pub mod storage;

use thiserror::Error;

/// Main error type for Immo-Ripple operations
#[derive(Debug, Error)]
pub enum ImmoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Target site unreachable: none of {pages} list pages could be fetched")]
    SiteUnreachable { pages: u32 },

    #[error("Unknown site adapter: {0}")]
    UnknownSite(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Search index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] snapshot::SnapshotError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Immo-Ripple operations
pub type Result<T> = std::result::Result<T, ImmoError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{CanonicalRecord, FieldValue, RawRecord, StoredRecord};
pub use sites::SiteAdapter;
