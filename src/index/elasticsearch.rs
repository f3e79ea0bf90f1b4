//! Elasticsearch backend over its REST API

use crate::config::IndexConfig;
use crate::index::traits::{BulkAction, BulkItem, BulkResponse, SearchIndex};
use crate::index::{IndexError, IndexResult};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Elasticsearch node reachable at a base URL
pub struct ElasticsearchIndex {
    client: Client,
    base_url: String,
}

impl ElasticsearchIndex {
    pub fn new(base_url: &str, timeout: Duration) -> IndexResult<Self> {
        Url::parse(base_url).map_err(|e| IndexError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &IndexConfig) -> IndexResult<Self> {
        Self::new(
            &config.url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    async fn index_exists(&self, index: &str) -> IndexResult<bool> {
        let response = self.client.head(self.endpoint(index)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(status_error(response).await),
        }
    }

    async fn create_index(&self, index: &str, mapping: &Value) -> IndexResult<()> {
        let response = self
            .client
            .put(self.endpoint(index))
            .json(&json!({ "mappings": mapping }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        tracing::info!("Created index {}", index);
        Ok(())
    }

    async fn bulk(&self, actions: &[BulkAction]) -> IndexResult<BulkResponse> {
        if actions.is_empty() {
            return Ok(BulkResponse::default());
        }

        let body = ndjson_body(actions)?;

        let response = self
            .client
            .post(self.endpoint("_bulk"))
            .header("content-type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed: EsBulkResponse = response.json().await?;
        if parsed.items.len() != actions.len() {
            return Err(IndexError::UnexpectedResponse(format!(
                "bulk response has {} items for {} actions",
                parsed.items.len(),
                actions.len()
            )));
        }

        let items = parsed
            .items
            .into_iter()
            .zip(actions)
            .map(|(item, action)| {
                let result = item.into_values().next().unwrap_or_default();
                BulkItem {
                    id: result.id.unwrap_or_else(|| action.id.clone()),
                    status: result.status,
                    error: result.error.map(|e| error_reason(&e)),
                }
            })
            .collect();

        Ok(BulkResponse { items })
    }
}

/// Action line and source line per document, newline terminated
fn ndjson_body(actions: &[BulkAction]) -> IndexResult<String> {
    let mut body = String::new();

    for action in actions {
        let meta = json!({ "index": { "_index": action.index, "_id": action.id } });
        body.push_str(&serde_json::to_string(&meta)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&action.source)?);
        body.push('\n');
    }

    Ok(body)
}

async fn status_error(response: Response) -> IndexError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    IndexError::Status { status, body }
}

fn error_reason(error: &Value) -> String {
    error
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

#[derive(Debug, Deserialize)]
struct EsBulkResponse {
    items: Vec<HashMap<String, EsBulkItem>>,
}

#[derive(Debug, Default, Deserialize)]
struct EsBulkItem {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(default)]
    status: u16,
    error: Option<Value>,
}
