//! Field extraction helpers over parsed HTML documents
//!
//! These are stateless lookups shared by the site adapters:
//! - attribute lookup by label in the repeated "attribute item" structure
//! - key/value lookup in a list of `Key: value` lines
//! - free-text feature detection
//! - text concatenation for later regex-based extraction
//!
//! A label that cannot be found is reported as `None`, never as an error.

mod attributes;
mod text;

pub use attributes::{attribute_by_label, feature_present, keyed_list_value};
pub use text::{block_text, concatenated_text, first_text};

use scraper::{ElementRef, Selector};

/// Parses a selector that is known at compile time
///
/// Only used for hardcoded selectors in `LazyLock` statics.
pub(crate) fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("hardcoded selector is valid")
}

/// Text content of an element with each text node trimmed, empty nodes
/// dropped and the rest joined by a single space
pub fn element_text(element: ElementRef<'_>) -> String {
    join_text(element, " ")
}

/// Case-folds label text for comparison
///
/// Lowercases and expands `ß` to `ss`, so "Straße" and "STRASSE" compare
/// equal.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase().replace('ß', "ss")
}

pub(crate) fn join_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
