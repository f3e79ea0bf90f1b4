//! Integration tests for reindexing
//!
//! Stored listings are loaded into the in-memory index and into a mocked
//! Elasticsearch node.

use immo_ripple::index::{ElasticsearchIndex, IndexError, MemoryIndex, Reindexer, SearchIndex};
use immo_ripple::record::CanonicalRecord;
use immo_ripple::snapshot::{read_snapshot, write_snapshot};
use immo_ripple::storage::{ListingStore, SqliteStore};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing(url: &str, price: &str) -> CanonicalRecord {
    let mut record = CanonicalRecord::empty(url);
    record.titel = Some("Neubauwohnung".to_string());
    record.preis = Some(price.to_string());
    record.wohnflaeche = Some("50 m²".to_string());
    record.address = Some("1020 Wien, Leopoldstadt".to_string());
    record.balkon = true;
    record
}

fn documents(store: &SqliteStore) -> Vec<Map<String, Value>> {
    store
        .load_all()
        .unwrap()
        .iter()
        .map(|listing| listing.to_document().unwrap())
        .collect()
}

#[tokio::test]
async fn test_reindex_replaces_documents_by_url() {
    let mut store = SqliteStore::new_in_memory().unwrap();
    let reindexer = Reindexer::new(MemoryIndex::new(), "listings", 500);
    reindexer.ensure_index().await.unwrap();

    store
        .upsert_all(&[
            listing("https://example.com/1", "€ 800"),
            listing("https://example.com/2", "€ 1.000"),
        ])
        .unwrap();
    let first = reindexer.reindex(documents(&store)).await.unwrap();
    assert_eq!(first.indexed, 2);

    store
        .upsert_all(&[listing("https://example.com/1", "€ 750")])
        .unwrap();
    let second = reindexer.reindex(documents(&store)).await.unwrap();
    assert_eq!(second.indexed, 2);

    let index = reindexer.backend();
    assert_eq!(index.len("listings"), 2);

    let doc = index.get("listings", "https://example.com/1").unwrap();
    assert_eq!(doc["preis"], json!(750.0));
    assert_eq!(doc["preis_text"], "€ 750");
    assert_eq!(doc["eur_per_m2"], json!(15.0));
    assert_eq!(doc["bezirk"], 2);
    assert_eq!(doc["balkon"], true);
    assert_eq!(doc["garage"], false);
    assert!(doc.contains_key("first_seen_at"));
    assert!(!doc.contains_key("_id"));
}

#[tokio::test]
async fn test_reindex_from_snapshot_file() {
    let temp_dir = TempDir::new().unwrap();
    let snapshot = temp_dir.path().join("snapshots").join("es_data.jsonl");

    let mut store = SqliteStore::new_in_memory().unwrap();
    store
        .upsert_all(&[
            listing("https://example.com/1", "€ 800"),
            listing("https://example.com/2", "auf Anfrage"),
        ])
        .unwrap();

    let written = write_snapshot(&snapshot, &store.load_all().unwrap()).unwrap();
    assert_eq!(written, 2);

    let mut docs = read_snapshot(&snapshot).unwrap();
    docs.push(json!({ "titel": "ohne url" }).as_object().unwrap().clone());

    let reindexer = Reindexer::new(MemoryIndex::new(), "listings", 1);
    let report = reindexer.reindex(docs).await.unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(report.skipped_without_url, 1);

    let doc = reindexer
        .backend()
        .get("listings", "https://example.com/2")
        .unwrap();
    assert_eq!(doc["preis"], Value::Null);
    assert_eq!(doc["preis_text"], "auf Anfrage");
    assert!(!doc.contains_key("eur_per_m2"));
}

#[tokio::test]
async fn test_elasticsearch_creates_missing_index() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/listings"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/listings"))
        .and(body_string_contains("\"mappings\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "acknowledged": true })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = ElasticsearchIndex::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let reindexer = Reindexer::new(backend, "listings", 500);

    assert!(reindexer.ensure_index().await.unwrap());
}

#[tokio::test]
async fn test_elasticsearch_existing_index_is_kept() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/listings"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let backend = ElasticsearchIndex::new(&server.uri(), Duration::from_secs(5)).unwrap();
    assert!(backend.index_exists("listings").await.unwrap());

    let reindexer = Reindexer::new(backend, "listings", 500);
    assert!(!reindexer.ensure_index().await.unwrap());
}

#[tokio::test]
async fn test_elasticsearch_bulk_reports_item_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(header("content-type", "application/x-ndjson"))
        .and(body_string_contains("\"_id\":\"https://example.com/1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "_index": "listings", "_id": "https://example.com/1", "status": 201 } },
                { "index": {
                    "_index": "listings",
                    "_id": "https://example.com/2",
                    "status": 400,
                    "error": { "type": "mapper_parsing_exception", "reason": "failed to parse field [zimmer]" }
                } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut store = SqliteStore::new_in_memory().unwrap();
    store
        .upsert_all(&[
            listing("https://example.com/1", "€ 800"),
            listing("https://example.com/2", "€ 900"),
        ])
        .unwrap();

    let backend = ElasticsearchIndex::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let reindexer = Reindexer::new(backend, "listings", 500);
    let report = reindexer.reindex(documents(&store)).await.unwrap();

    assert_eq!(report.indexed, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "https://example.com/2");
    assert_eq!(report.failed[0].reason, "failed to parse field [zimmer]");
}

#[tokio::test]
async fn test_rejected_batch_keeps_earlier_batches() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(body_string_contains("\"_id\":\"https://example.com/1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": false,
            "items": [
                { "index": { "_id": "https://example.com/1", "status": 201 } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(body_string_contains("\"_id\":\"https://example.com/2\""))
        .respond_with(ResponseTemplate::new(413).set_body_string("too large"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = ElasticsearchIndex::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let reindexer = Reindexer::new(backend, "listings", 1);

    let docs = vec![
        json!({ "url": "https://example.com/1" }).as_object().unwrap().clone(),
        json!({ "url": "https://example.com/2" }).as_object().unwrap().clone(),
    ];
    let report = reindexer.reindex(docs).await.unwrap();

    assert_eq!(report.indexed, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "https://example.com/2");
    assert_eq!(report.failed[0].reason, "HTTP 413: too large");
}

#[tokio::test]
async fn test_unreachable_backend_aborts_reindex() {
    let backend = ElasticsearchIndex::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let reindexer = Reindexer::new(backend, "listings", 500);

    let docs = vec![json!({ "url": "https://example.com/1" })
        .as_object()
        .unwrap()
        .clone()];
    let result = reindexer.reindex(docs).await;

    assert!(matches!(result, Err(IndexError::Transport(_))));
}
