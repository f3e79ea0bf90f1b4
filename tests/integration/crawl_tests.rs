//! Integration tests for the crawler
//!
//! These tests use wiremock to serve list and detail pages and run the
//! full crawl cycle end-to-end against a SQLite store.

use immo_ripple::config::{parse_config, Config};
use immo_ripple::crawler::crawl;
use immo_ripple::storage::{open_store, ListingStore, RunStatus};
use immo_ripple::ImmoError;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PATH: &str = "/iad/immobilien/mietwohnungen/wien";

/// Creates a willhaben test configuration pointed at the mock server
fn create_test_config(base_url: &str, pages: u32, db_path: &str) -> Config {
    parse_config(&format!(
        r#"
[crawler]
site = "willhaben"
pages = {pages}
min-delay-ms = 0
max-delay-ms = 0
workers = 2
request-timeout-secs = 5
base-url = "{base_url}"

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
database-path = "{db_path}"
snapshot-path = "{db_path}.jsonl"
"#
    ))
    .expect("test config is valid")
}

fn list_page(ids: &[&str]) -> String {
    let anchors: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<a href="/iad/immobilien/d/{id}" data-testid="search-result-entry-header-{id}">{id}</a>"#
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", anchors)
}

fn detail_page(title: &str, price: &str) -> String {
    format!(
        r#"<html><body>
        <h1>{title}</h1>
        <span data-testid="contact-box-price-box-price-value-0">{price}</span>
        <div data-testid="object-location-address">1070 Wien, Neubau</div>
        <ul>
          <li data-testid="attribute-item">
            <div data-testid="attribute-title">Balkon</div>
            <div data-testid="attribute-value"><svg></svg></div>
          </li>
          <li data-testid="attribute-item">
            <div data-testid="attribute-title">Keller</div>
            <div data-testid="attribute-value"><svg></svg></div>
          </li>
          <li data-testid="attribute-item">
            <div data-testid="attribute-title">Bautyp</div>
            <div data-testid="attribute-value">Altbau</div>
          </li>
          <li data-testid="attribute-item">
            <div data-testid="attribute-title">Wohnfläche</div>
            <div data-testid="attribute-value">62 m²</div>
          </li>
        </ul>
        <div data-testid="ad-description-Lage"><p>Nahe Westbahnhof</p></div>
        </body></html>"#
    )
}

async fn mount_list_page(server: &MockServer, page: &str, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(list_page(ids)))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, title: &str, price: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/iad/immobilien/d/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(title, price)))
        .mount(server)
        .await;
}

async fn mount_site(server: &MockServer) {
    mount_list_page(server, "1", &["a-1", "b-2"]).await;
    mount_list_page(server, "2", &["b-2", "c-3"]).await;
    mount_detail(server, "a-1", "Wohnung A", "€ 900").await;
    mount_detail(server, "b-2", "Wohnung B", "€ 1.050").await;
    mount_detail(server, "c-3", "Wohnung C", "€ 1.200,50").await;
}

#[tokio::test]
async fn test_full_crawl_is_idempotent() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("immo.db");
    let config = create_test_config(&server.uri(), 2, db_path.to_str().unwrap());
    let mut store = open_store(&db_path).unwrap();

    let first = crawl(&config, "hash-1", &mut store).await.unwrap();
    assert_eq!(first.list_pages_fetched, 2);
    assert_eq!(first.records, 3);
    assert!(first.skipped.is_empty());
    assert_eq!(first.stats.upserted, 3);
    assert_eq!(first.stats.matched, 0);
    assert_eq!(store.count().unwrap(), 3);

    let second = crawl(&config, "hash-1", &mut store).await.unwrap();
    assert_eq!(second.records, 3);
    assert_eq!(second.stats.upserted, 0);
    assert_eq!(second.stats.matched, 3);
    assert_eq!(second.stats.modified, 0);
    assert_eq!(store.count().unwrap(), 3);

    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.id, second.run_id);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "hash-1");
    assert_eq!(run.summary.stats.matched, 3);
}

#[tokio::test]
async fn test_crawl_stores_normalized_records() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("immo.db");
    let config = create_test_config(&server.uri(), 2, db_path.to_str().unwrap());
    let mut store = open_store(&db_path).unwrap();

    crawl(&config, "hash", &mut store).await.unwrap();

    let url = format!("{}/iad/immobilien/d/b-2", server.uri());
    let stored = store.get(&url).unwrap().expect("listing b-2 is stored");
    let record = &stored.record;

    assert_eq!(record.titel.as_deref(), Some("Wohnung B"));
    assert_eq!(record.preis.as_deref(), Some("€ 1.050"));
    assert_eq!(record.wohnflaeche.as_deref(), Some("62 m²"));
    assert!(record.balkon);
    assert!(record.keller);
    assert_eq!(record.bautyp.as_deref(), Some("Altbau"));
    assert!(!record.garage);

    let urls: Vec<String> = store
        .load_all()
        .unwrap()
        .into_iter()
        .map(|listing| listing.record.url)
        .collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/iad/immobilien/d/a-1", server.uri()),
            format!("{}/iad/immobilien/d/b-2", server.uri()),
            format!("{}/iad/immobilien/d/c-3", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_changed_listing_counts_as_modified() {
    let server = MockServer::start().await;
    mount_list_page(&server, "1", &["a-1", "b-2"]).await;
    mount_detail(&server, "a-1", "Wohnung A", "€ 900").await;
    mount_detail(&server, "b-2", "Wohnung B", "€ 1.050").await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("immo.db");
    let config = create_test_config(&server.uri(), 1, db_path.to_str().unwrap());
    let mut store = open_store(&db_path).unwrap();

    crawl(&config, "hash", &mut store).await.unwrap();
    let url = format!("{}/iad/immobilien/d/b-2", server.uri());
    let before = store.get(&url).unwrap().unwrap();

    server.reset().await;
    mount_list_page(&server, "1", &["a-1", "b-2"]).await;
    mount_detail(&server, "a-1", "Wohnung A", "€ 900").await;
    mount_detail(&server, "b-2", "Wohnung B", "€ 990").await;

    let report = crawl(&config, "hash", &mut store).await.unwrap();
    assert_eq!(report.stats.matched, 2);
    assert_eq!(report.stats.modified, 1);
    assert_eq!(report.stats.upserted, 0);

    let after = store.get(&url).unwrap().unwrap();
    assert_eq!(after.record.preis.as_deref(), Some("€ 990"));
    assert_eq!(after.first_seen_at, before.first_seen_at);
    assert!(after.scraped_at >= before.scraped_at);
}

#[tokio::test]
async fn test_failed_detail_page_is_skipped() {
    let server = MockServer::start().await;
    mount_list_page(&server, "1", &["a-1", "gone-9"]).await;
    mount_detail(&server, "a-1", "Wohnung A", "€ 900").await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("immo.db");
    let config = create_test_config(&server.uri(), 1, db_path.to_str().unwrap());
    let mut store = open_store(&db_path).unwrap();

    let report = crawl(&config, "hash", &mut store).await.unwrap();

    assert_eq!(report.records, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(
        report.skipped[0].url,
        format!("{}/iad/immobilien/d/gone-9", server.uri())
    );
    assert!(report.skipped[0].reason.contains("404"));
    assert_eq!(store.count().unwrap(), 1);

    let run = store.get_run(report.run_id).unwrap();
    assert_eq!(run.summary.skipped, 1);
}

#[tokio::test]
async fn test_unreachable_site_fails_run() {
    let server = MockServer::start().await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("immo.db");
    let config = create_test_config(&server.uri(), 2, db_path.to_str().unwrap());
    let mut store = open_store(&db_path).unwrap();

    let result = crawl(&config, "hash", &mut store).await;
    assert!(matches!(result, Err(ImmoError::SiteUnreachable { pages: 2 })));

    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.finished_at.is_some());
    assert_eq!(store.count().unwrap(), 0);
}
