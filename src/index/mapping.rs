use crate::index::numeric::NUMERIC_FIELDS;
use crate::record::{BOOLEAN_FLAGS, EXTRA_FLAGS};
use serde_json::{json, Map, Value};

/// Field mapping of the listing index
pub fn listing_mapping() -> Value {
    let mut properties = Map::new();

    properties.insert("url".to_string(), json!({ "type": "keyword" }));
    properties.insert("titel".to_string(), json!({ "type": "text" }));
    properties.insert("address".to_string(), json!({ "type": "text" }));
    properties.insert("bautyp".to_string(), json!({ "type": "keyword" }));
    properties.insert("zustand".to_string(), json!({ "type": "keyword" }));
    properties.insert("bezirk".to_string(), json!({ "type": "integer" }));
    properties.insert("eur_per_m2".to_string(), json!({ "type": "float" }));

    for field in NUMERIC_FIELDS {
        properties.insert(field.to_string(), json!({ "type": "float" }));
        properties.insert(format!("{}_text", field), json!({ "type": "keyword" }));
    }

    for flag in BOOLEAN_FLAGS.iter().chain(EXTRA_FLAGS.iter()) {
        properties.insert(flag.to_string(), json!({ "type": "boolean" }));
    }

    for timestamp in ["first_seen_at", "scraped_at"] {
        properties.insert(timestamp.to_string(), json!({ "type": "date" }));
    }

    json!({ "properties": properties })
}
