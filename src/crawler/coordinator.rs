//! Crawler coordinator - main crawl orchestration logic
//!
//! Walks the list pages of one site in order, collects detail links that
//! have not been seen during this run, and processes them through a bounded
//! worker pool. Detail results come back in link order, regardless of which
//! worker finished first.

use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::normalize::normalize;
use crate::record::CanonicalRecord;
use crate::sites::{adapter_for, SiteAdapter};
use crate::ImmoError;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Detail URLs already scheduled during the current run
#[derive(Debug, Default)]
pub struct VisitedUrls {
    inner: Mutex<HashSet<String>>,
}

impl VisitedUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as visited, returning whether it was new
    pub fn insert(&self, url: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A detail page that produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUrl {
    pub url: String,
    pub reason: String,
}

/// Everything one crawl run produced
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Normalized records in list-page, then link order
    pub records: Vec<CanonicalRecord>,
    pub skipped: Vec<SkippedUrl>,
    pub list_pages_fetched: u32,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    adapter: Box<dyn SiteAdapter>,
    fetcher: Fetcher,
    pages: u32,
    workers: usize,
}

impl Coordinator {
    /// Creates a coordinator from its parts
    ///
    /// `workers` is clamped to at least 1.
    pub fn new(adapter: Box<dyn SiteAdapter>, fetcher: Fetcher, pages: u32, workers: usize) -> Self {
        Self {
            adapter,
            fetcher,
            pages,
            workers: workers.max(1),
        }
    }

    /// Creates a coordinator for the configured site
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Adapter and HTTP client are ready
    /// * `Err(ImmoError)` - Unknown site, bad base URL or client build failure
    pub fn from_config(config: &Config) -> Result<Self, ImmoError> {
        let adapter = adapter_for(&config.crawler.site, config.crawler.base_url.as_deref())?;
        let fetcher = Fetcher::from_config(config)?;

        Ok(Self::new(
            adapter,
            fetcher,
            config.crawler.pages,
            config.crawler.workers as usize,
        ))
    }

    pub fn site(&self) -> &str {
        self.adapter.name()
    }

    /// Runs the crawl
    ///
    /// For each list page:
    /// 1. Fetch the page; on failure log and move on
    /// 2. Extract detail links and drop those already seen in this run
    /// 3. Fetch, extract and normalize the new links with up to `workers`
    ///    requests in flight
    ///
    /// Detail failures are recorded as skipped URLs.
    ///
    /// # Errors
    ///
    /// * `ImmoError::SiteUnreachable` - not a single list page could be fetched
    pub async fn run(&self) -> Result<CrawlOutcome, ImmoError> {
        tracing::info!(
            "Crawling {} list pages of {} with {} workers",
            self.pages,
            self.adapter.name(),
            self.workers
        );

        let visited = VisitedUrls::new();
        let mut outcome = CrawlOutcome::default();

        for page in 1..=self.pages {
            let list_url = self.adapter.list_page_url(page);

            let html = match self.fetcher.fetch(&list_url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Skipping list page {}: {}", page, e);
                    continue;
                }
            };
            outcome.list_pages_fetched += 1;

            let links: Vec<String> = self
                .adapter
                .extract_links(&html)
                .into_iter()
                .filter(|url| visited.insert(url))
                .collect();

            tracing::info!("List page {}: {} new detail links", page, links.len());

            let results: Vec<_> = stream::iter(links)
                .map(|url| self.process_detail(url))
                .buffered(self.workers)
                .collect()
                .await;

            for result in results {
                match result {
                    Ok(record) => outcome.records.push(record),
                    Err(skipped) => outcome.skipped.push(skipped),
                }
            }
        }

        if outcome.list_pages_fetched == 0 {
            tracing::error!("None of {} list pages could be fetched", self.pages);
            return Err(ImmoError::SiteUnreachable { pages: self.pages });
        }

        tracing::info!(
            "Crawl finished: {} records, {} skipped, {} unique links",
            outcome.records.len(),
            outcome.skipped.len(),
            visited.len()
        );

        Ok(outcome)
    }

    /// Fetches, extracts and normalizes one detail page
    async fn process_detail(&self, url: String) -> Result<CanonicalRecord, SkippedUrl> {
        let skip = |reason: String| {
            tracing::warn!("Skipping {}: {}", url, reason);
            SkippedUrl {
                url: url.clone(),
                reason,
            }
        };

        let html = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|e| skip(e.to_string()))?;

        let raw = self.adapter.extract_record(&html, &url);
        let record = normalize(raw).map_err(|e| skip(e.to_string()))?;

        tracing::debug!("Extracted {}", url);
        Ok(record)
    }
}
