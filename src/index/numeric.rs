//! Numeric projection of listing documents
//!
//! Sites display prices, areas and room counts as German-formatted text
//! (`€ 1.234,56`, `81,76 m²`). The store keeps that text untouched; the
//! search index gets parsed floats next to the original text so range
//! queries work.

use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::LazyLock;

/// Text fields projected to floats, each keeping its text in `<field>_text`
pub const NUMERIC_FIELDS: [&str; 3] = ["preis", "wohnfläche", "zimmer"];

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}(?:\.[0-9]{3})+(?:,[0-9]+)?|[0-9]+,[0-9]+|[0-9]+\.[0-9]+|[0-9]+")
        .expect("hardcoded regex pattern is valid")
});

static GROUPED_INTEGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,3}(?:\.[0-9]{3})+$").expect("hardcoded regex pattern is valid")
});

static VIENNA_POSTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b1([0-9]{2})0\b").expect("hardcoded regex pattern is valid"));

/// Parses the first number in `text`, German locale first
///
/// | text          | value   |
/// |---------------|---------|
/// | `€ 1.234,56`  | 1234.56 |
/// | `1.050`       | 1050.0  |
/// | `81,76 m²`    | 81.76   |
/// | `2.5`         | 2.5     |
/// | `3 Zimmer`    | 3.0     |
pub fn parse_decimal(text: &str) -> Option<f64> {
    let raw = NUMBER.find(text)?.as_str();

    let normalized = if raw.contains(',') {
        raw.replace('.', "").replace(',', ".")
    } else if GROUPED_INTEGER.is_match(raw) {
        raw.replace('.', "")
    } else {
        raw.to_string()
    };

    normalized.parse().ok()
}

/// Vienna district number from a `1XX0` postal code in an address
pub fn vienna_district(address: &str) -> Option<u8> {
    VIENNA_POSTCODE
        .captures_iter(address)
        .filter_map(|c| c[1].parse::<u8>().ok())
        .find(|district| (1..=23).contains(district))
}

/// Adds numeric fields to an index document in place
///
/// - `preis`, `wohnfläche`, `zimmer`: text moves to `<field>_text`, the field
///   becomes a float or `null` when unparseable
/// - `bezirk`: district from the address, if any
/// - `eur_per_m2`: price per square meter when both are positive
pub fn project(doc: &mut Map<String, Value>) {
    let mut parsed = [None; NUMERIC_FIELDS.len()];

    for (slot, field) in parsed.iter_mut().zip(NUMERIC_FIELDS) {
        let value = match doc.get(field).cloned() {
            Some(Value::String(text)) => {
                let number = parse_decimal(&text);
                doc.insert(format!("{}_text", field), Value::String(text));
                number
            }
            Some(Value::Number(n)) => n.as_f64(),
            _ => None,
        };

        if doc.contains_key(field) {
            doc.insert(field.to_string(), to_json_number(value));
        }
        *slot = value;
    }

    if let Some(district) = doc
        .get("address")
        .and_then(Value::as_str)
        .and_then(vienna_district)
    {
        doc.insert("bezirk".to_string(), Value::from(district));
    }

    if let [Some(preis), Some(flaeche), _] = parsed {
        if preis > 0.0 && flaeche > 0.0 {
            let per_m2 = (preis / flaeche * 100.0).round() / 100.0;
            doc.insert("eur_per_m2".to_string(), to_json_number(Some(per_m2)));
        }
    }
}

fn to_json_number(value: Option<f64>) -> Value {
    value
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
