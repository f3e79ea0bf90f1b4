//! Text collection helpers

use super::{element_text, join_text};
use scraper::{Html, Selector};

/// Joins the text of every element matching `selector` with line breaks
///
/// Elements without text are skipped. An invalid selector yields an empty
/// string.
pub fn concatenated_text(doc: &Html, selector: &str) -> String {
    let Ok(selector) = Selector::parse(selector) else {
        tracing::debug!("Invalid selector: {}", selector);
        return String::new();
    };

    doc.select(&selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of the first element matching `selector`
pub fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector).next().map(element_text)
}

/// Text of the first matching element with its text nodes on separate lines
///
/// Used for multi-paragraph description blocks. Returns an empty string
/// when nothing matches.
pub fn block_text(doc: &Html, selector: &str) -> String {
    Selector::parse(selector)
        .ok()
        .and_then(|selector| doc.select(&selector).next())
        .map(|el| join_text(el, "\n"))
        .unwrap_or_default()
}
