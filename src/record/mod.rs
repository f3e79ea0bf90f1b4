//! Record types flowing through the pipeline
//!
//! - `RawRecord`: what a site adapter extracted from one detail page
//! - `CanonicalRecord`: the normalized, schema-stable listing
//! - `StoredRecord`: a canonical record plus store provenance timestamps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Canonical boolean flags, in schema order
pub const BOOLEAN_FLAGS: [&str; 8] = [
    "balkon",
    "terrasse",
    "fahrstuhl",
    "einbauküche",
    "garage",
    "parkplatz",
    "teilmöbliert_/_möbliert",
    "keller",
];

/// Adapter-specific fields that are boolean-valued but not part of the fixed schema
pub const EXTRA_FLAGS: [&str; 4] = ["abstellraum", "barrierefrei", "carport", "haustiere_erlaubt"];

/// Raw record key holding the free-text feature block
pub const DETAILS_FIELD: &str = "details";

/// A single extracted value
///
/// `Flag(true)` is produced when a labeled attribute has no text but carries
/// an iconographic "present" marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }
}

/// Site-specific attribute mapping for one detail page
///
/// Keys are lowercase-with-underscores labels. A key mapped to `None` means
/// the adapter looked for the label and did not find it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    fields: BTreeMap<String, Option<FieldValue>>,
}

impl RawRecord {
    /// Starts a record for the given detail page URL
    pub fn new(url: &str) -> Self {
        let mut record = Self::default();
        record.insert("url", Some(FieldValue::text(url)));
        record
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Option<FieldValue>) {
        self.fields.insert(key.into(), value);
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, Some(FieldValue::text(value)));
    }

    pub fn insert_opt_text(&mut self, key: impl Into<String>, value: Option<String>) {
        self.insert(key, value.map(FieldValue::Text));
    }

    /// Builder-style insert, mostly useful in tests
    pub fn with(mut self, key: &str, value: Option<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// The extracted value, `None` if absent or looked up but not found
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key).and_then(Option::as_ref)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn url(&self) -> Option<&str> {
        self.text("url")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<FieldValue>)> {
        self.fields.iter()
    }

    pub fn into_fields(self) -> BTreeMap<String, Option<FieldValue>> {
        self.fields
    }
}

/// The canonical listing shape every site adapter normalizes into
///
/// Numeric attributes (`preis`, `wohnfläche`, `zimmer`) are kept as the text
/// the site displayed. Locale-aware parsing happens when documents are
/// projected for the search index, see [`crate::index::numeric`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub url: String,
    pub titel: Option<String>,
    pub preis: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "wohnfläche")]
    pub wohnflaeche: Option<String>,
    pub zimmer: Option<String>,
    pub bautyp: Option<String>,
    pub zustand: Option<String>,

    pub balkon: bool,
    pub terrasse: bool,
    pub fahrstuhl: bool,
    #[serde(rename = "einbauküche")]
    pub einbaukueche: bool,
    pub garage: bool,
    pub parkplatz: bool,
    #[serde(rename = "teilmöbliert_/_möbliert")]
    pub moebliert: bool,
    pub keller: bool,

    /// Adapter-specific optional fields and free-text description blocks
    #[serde(flatten)]
    pub details: BTreeMap<String, Value>,
}

impl CanonicalRecord {
    /// Creates a record with every optional field empty and every flag false
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            titel: None,
            preis: None,
            address: None,
            wohnflaeche: None,
            zimmer: None,
            bautyp: None,
            zustand: None,
            balkon: false,
            terrasse: false,
            fahrstuhl: false,
            einbaukueche: false,
            garage: false,
            parkplatz: false,
            moebliert: false,
            keller: false,
            details: BTreeMap::new(),
        }
    }

    /// Mutable access to a canonical flag by its schema name
    pub fn flag_mut(&mut self, name: &str) -> Option<&mut bool> {
        match name {
            "balkon" => Some(&mut self.balkon),
            "terrasse" => Some(&mut self.terrasse),
            "fahrstuhl" => Some(&mut self.fahrstuhl),
            "einbauküche" => Some(&mut self.einbaukueche),
            "garage" => Some(&mut self.garage),
            "parkplatz" => Some(&mut self.parkplatz),
            "teilmöbliert_/_möbliert" => Some(&mut self.moebliert),
            "keller" => Some(&mut self.keller),
            _ => None,
        }
    }

    /// Canonical flags paired with their schema names, in schema order
    pub fn flags(&self) -> [(&'static str, bool); 8] {
        [
            (BOOLEAN_FLAGS[0], self.balkon),
            (BOOLEAN_FLAGS[1], self.terrasse),
            (BOOLEAN_FLAGS[2], self.fahrstuhl),
            (BOOLEAN_FLAGS[3], self.einbaukueche),
            (BOOLEAN_FLAGS[4], self.garage),
            (BOOLEAN_FLAGS[5], self.parkplatz),
            (BOOLEAN_FLAGS[6], self.moebliert),
            (BOOLEAN_FLAGS[7], self.keller),
        ]
    }

    /// Mutable access to a canonical text field by its schema name
    pub fn text_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "titel" => Some(&mut self.titel),
            "preis" => Some(&mut self.preis),
            "address" => Some(&mut self.address),
            "wohnfläche" => Some(&mut self.wohnflaeche),
            "zimmer" => Some(&mut self.zimmer),
            "bautyp" => Some(&mut self.bautyp),
            "zustand" => Some(&mut self.zustand),
            _ => None,
        }
    }

    /// Serializes the record into a JSON object keyed by schema names
    pub fn to_document(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Ok(Map::from_iter([("url".to_string(), other)])),
        }
    }
}

/// A canonical record as persisted by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Internal row identity, never exported
    pub id: i64,
    pub record: CanonicalRecord,
    pub first_seen_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
}

impl StoredRecord {
    /// JSON document with provenance timestamps, without the internal id
    pub fn to_document(&self) -> serde_json::Result<Map<String, Value>> {
        let mut doc = self.record.to_document()?;
        doc.insert(
            "first_seen_at".to_string(),
            Value::String(self.first_seen_at.to_rfc3339()),
        );
        doc.insert(
            "scraped_at".to_string(),
            Value::String(self.scraped_at.to_rfc3339()),
        );
        Ok(doc)
    }
}
