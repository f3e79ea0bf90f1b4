//! Normalization of raw site records into the canonical schema
//!
//! This module handles:
//! - URL identity validation
//! - Boolean coercion of flag-like fields
//! - Keyword inference of flags from free-text detail blocks
//! - Labeled-line extraction (condition, construction type, flooring, year)
//!
//! The mapping is deterministic and identical for every site adapter.

mod coerce;
mod features;

pub use coerce::{truthy, truthy_json};
pub use features::{analyze_details, resolve_condition, DetailFacts, FEATURE_KEYWORDS};

use crate::record::{CanonicalRecord, FieldValue, RawRecord, DETAILS_FIELD, EXTRA_FLAGS};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Reasons a raw record cannot become a canonical record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("record has no url")]
    IdentityMissing,

    #[error("record url is not an absolute http(s) URL: {0}")]
    InvalidUrl(String),
}

/// Maps a raw record to the canonical schema
///
/// # Rules
///
/// - `url` must be present and an absolute http(s) URL
/// - canonical text fields are trimmed; empty text becomes `None`
/// - canonical and extra flags are coerced with [`truthy`]
/// - flags the site did not label explicitly are inferred from the
///   `details` block, if there is one
/// - `zustand`/`bautyp`/`böden`/`baujahr` found in `details` fill only the
///   fields the site did not provide
/// - every other field is kept under `details` unchanged
///
/// # Errors
///
/// * `NormalizeError::IdentityMissing` - no usable url
/// * `NormalizeError::InvalidUrl` - url is not absolute http(s)
pub fn normalize(raw: RawRecord) -> Result<CanonicalRecord, NormalizeError> {
    let url = validate_url(raw.url())?;
    let mut record = CanonicalRecord::empty(url);

    let facts = raw.text(DETAILS_FIELD).map(analyze_details);
    let labeled: Vec<String> = raw
        .iter()
        .filter(|(_, value)| value.is_some())
        .map(|(key, _)| key.clone())
        .collect();

    for (key, value) in raw.into_fields() {
        if key == "url" {
            continue;
        }

        if let Some(slot) = record.text_mut(&key) {
            *slot = clean_text(value.as_ref());
        } else if let Some(flag) = record.flag_mut(&key) {
            *flag = truthy(value.as_ref());
        } else if EXTRA_FLAGS.contains(&key.as_str()) {
            record
                .details
                .insert(key, Value::Bool(truthy(value.as_ref())));
        } else {
            record.details.insert(key, to_json(value));
        }
    }

    if let Some(facts) = facts {
        apply_details(&mut record, facts, &labeled);
    }

    Ok(record)
}

/// Folds facts inferred from the details block into the record
fn apply_details(record: &mut CanonicalRecord, facts: DetailFacts, labeled: &[String]) {
    let is_labeled = |name: &str| labeled.iter().any(|k| k == name);

    for (name, present) in facts.flags {
        if is_labeled(name) {
            continue;
        }
        match record.flag_mut(name) {
            Some(flag) => *flag = present,
            None => {
                record.details.insert(name.to_string(), Value::Bool(present));
            }
        }
    }

    if record.zustand.is_none() {
        record.zustand = facts.zustand;
    }
    if record.bautyp.is_none() {
        record.bautyp = facts.bautyp;
    }

    if let Some(boeden) = facts.boeden {
        if !has_detail_text(record, "böden") {
            record.details.insert("böden".to_string(), Value::String(boeden));
        }
    }
    if let Some(year) = facts.baujahr {
        record
            .details
            .entry("baujahr".to_string())
            .or_insert(Value::from(year));
    }
}

fn has_detail_text(record: &CanonicalRecord, key: &str) -> bool {
    matches!(record.details.get(key), Some(Value::String(s)) if !s.trim().is_empty())
}

fn validate_url(url: Option<&str>) -> Result<String, NormalizeError> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(NormalizeError::IdentityMissing)?;

    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url.to_string()),
        _ => Err(NormalizeError::InvalidUrl(url.to_string())),
    }
}

fn clean_text(value: Option<&FieldValue>) -> Option<String> {
    value
        .and_then(FieldValue::as_text)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn to_json(value: Option<FieldValue>) -> Value {
    match value {
        Some(FieldValue::Text(text)) => Value::String(text),
        Some(FieldValue::Flag(flag)) => Value::Bool(flag),
        None => Value::Null,
    }
}
