//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Rate-limited GET requests through the shared `RateLimiter`
//! - Error classification into `FetchError`

use crate::config::{Config, UserAgentConfig};
use crate::crawler::limiter::RateLimiter;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Reasons a page could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The URL the failed request was for
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. } | Self::Status { url, .. } | Self::Transport { url, .. } => {
                url
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use immo_ripple::config::UserAgentConfig;
/// use immo_ripple::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "ImmoRipple".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(20)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited page fetcher shared by all workers of a run
pub struct Fetcher {
    client: Client,
    limiter: RateLimiter,
}

impl Fetcher {
    pub fn new(client: Client, limiter: RateLimiter) -> Self {
        Self { client, limiter }
    }

    /// Builds the client and limiter from the run configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;
        Ok(Self::new(client, RateLimiter::from_config(&config.crawler)))
    }

    /// Fetches a page body
    ///
    /// Waits for a rate limiter slot first. No retries: a non-success
    /// status or a transport failure is returned to the caller.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        self.limiter.acquire().await;
        tracing::debug!("GET {}", url);

        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(parsed).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(transport)
    }
}
