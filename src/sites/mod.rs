//! Site adapters
//!
//! Every supported listing site gets one `SiteAdapter` implementation that
//! knows the site's list-page URLs, how to find detail links on a list page
//! and which labels to extract from a detail page. New sites are added by
//! adding an implementation and registering it in [`adapter_for`]; the
//! crawler never branches on the site.

mod immowelt;
mod willhaben;

pub use immowelt::ImmoweltAdapter;
pub use willhaben::WillhabenAdapter;

use crate::record::RawRecord;
use crate::ImmoError;
use std::collections::HashSet;
use url::Url;

/// Names accepted by [`adapter_for`]
pub const SITE_NAMES: [&str; 2] = ["willhaben", "immowelt"];

/// Per-site extraction capabilities
pub trait SiteAdapter: Send + Sync {
    /// Short identifier of the site
    fn name(&self) -> &str;

    /// Absolute URL of list page `page` (1-based)
    fn list_page_url(&self, page: u32) -> String;

    /// Extracts absolute detail-page URLs from a list page
    ///
    /// Each URL appears once, in order of first occurrence.
    fn extract_links(&self, list_html: &str) -> Vec<String>;

    /// Extracts the raw attribute record of a detail page
    ///
    /// Labels that cannot be found map to `None`; this never fails.
    fn extract_record(&self, detail_html: &str, url: &str) -> RawRecord;
}

/// Builds the adapter registered under `name`
///
/// # Arguments
///
/// * `name` - One of [`SITE_NAMES`]
/// * `base_url` - Optional site root override (e.g. a mirror or test server)
pub fn adapter_for(name: &str, base_url: Option<&str>) -> Result<Box<dyn SiteAdapter>, ImmoError> {
    let root = base_url.map(Url::parse).transpose()?;

    match name {
        "willhaben" => {
            let root = root.unwrap_or(Url::parse(WillhabenAdapter::DEFAULT_ROOT)?);
            Ok(Box::new(WillhabenAdapter::new(root)?))
        }
        "immowelt" => {
            let root = root.unwrap_or(Url::parse(ImmoweltAdapter::DEFAULT_ROOT)?);
            Ok(Box::new(ImmoweltAdapter::new(root)?))
        }
        other => Err(ImmoError::UnknownSite(other.to_string())),
    }
}

/// Resolves an href against the site root
///
/// Returns None for empty hrefs, fragments, non-HTTP schemes and anything
/// that does not resolve to an http(s) URL.
pub(crate) fn resolve_link(href: &str, root: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match root.join(href) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        _ => None,
    }
}

/// Drops repeated URLs, keeping the first occurrence of each
pub(crate) fn dedup_in_order(urls: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
