use serde::Deserialize;

/// Main configuration structure for Immo-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

/// Crawl run parameters
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Site adapter name
    pub site: String,

    /// Number of list pages to walk, starting at page 1
    pub pages: u32,

    /// Lower bound of the randomized delay between requests (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized delay between requests (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Number of detail pages processed concurrently
    #[serde(default = "default_workers")]
    pub workers: u32,

    #[serde(rename = "request-timeout-secs", default = "default_crawl_timeout")]
    pub request_timeout_secs: u64,

    /// Overrides the adapter's site root
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the user agent as `Name/Version (+ContactURL; ContactEmail)`
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the JSONL snapshot file
    #[serde(rename = "snapshot-path")]
    pub snapshot_path: String,
}

/// Search index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Base URL of the Elasticsearch node
    #[serde(default = "default_index_url")]
    pub url: String,

    /// Index name
    #[serde(default = "default_index_name")]
    pub name: String,

    /// Documents per bulk request
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(rename = "request-timeout-secs", default = "default_index_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            name: default_index_name(),
            batch_size: default_batch_size(),
            request_timeout_secs: default_index_timeout(),
        }
    }
}

fn default_min_delay_ms() -> u64 {
    800
}

fn default_max_delay_ms() -> u64 {
    1800
}

fn default_workers() -> u32 {
    1
}

fn default_crawl_timeout() -> u64 {
    20
}

fn default_index_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_index_name() -> String {
    "willhaben_immobilien".to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_index_timeout() -> u64 {
    120
}
