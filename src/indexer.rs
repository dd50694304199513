use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::GalleryError;

/// Minimal asset stub as returned by the account endpoint, before
/// enrichment. Order is whatever the upstream indexer returns.
#[derive(Debug, Clone, Serialize)]
pub struct AssetStub {
    pub index: u64,
    pub name: Option<String>,
    pub unit_name: Option<String>,
    pub total: Option<u64>,
    pub params: Value,
}

/// Lists the assets created by the collection wallet, filtered to the
/// collection's unit-name marker. An empty result after a failure means
/// "unknown", not "no assets"; callers must not treat it as authoritative.
pub trait AccountIndexerClient: Send + Sync {
    fn list_created_assets(
        &self,
    ) -> impl Future<Output = Result<Vec<AssetStub>, GalleryError>> + Send;
}

pub struct AlgonodeHttpClient {
    client: Client,
    base_url: String,
    creator_address: String,
    unit_name: String,
}

impl AlgonodeHttpClient {
    pub fn new(config: &Config) -> Result<Self, GalleryError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("hodl-gallery/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GalleryError::IndexerHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| GalleryError::IndexerHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.indexer_base_url.clone(),
            creator_address: config.creator_address.clone(),
            unit_name: config.unit_name.clone(),
        })
    }

    fn account_url(&self) -> String {
        format!("{}/v2/accounts/{}", self.base_url, self.creator_address)
    }

    async fn handle_status(response: reqwest::Response) -> Result<reqwest::Response, GalleryError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "indexer request failed".to_string());
        Err(GalleryError::IndexerStatus { status, message })
    }
}

impl AccountIndexerClient for AlgonodeHttpClient {
    async fn list_created_assets(&self) -> Result<Vec<AssetStub>, GalleryError> {
        let url = self.account_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| GalleryError::IndexerHttp(err.to_string()))?;
        let response = Self::handle_status(response).await?;
        let raw: Value = response
            .json()
            .await
            .map_err(|err| GalleryError::IndexerHttp(err.to_string()))?;

        let created = raw
            .get("created-assets")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                GalleryError::IndexerHttp("unexpected account response structure".to_string())
            })?;

        let stubs: Vec<AssetStub> = created
            .iter()
            .filter_map(|entry| extract_stub(entry, &self.unit_name))
            .collect();
        debug!(
            total = created.len(),
            matched = stubs.len(),
            "listed created assets"
        );
        Ok(stubs)
    }
}

/// Keep only assets whose unit-name equals the collection marker.
fn extract_stub(entry: &Value, unit_name: &str) -> Option<AssetStub> {
    let params = entry.get("params")?;
    let marker = params.get("unit-name").and_then(Value::as_str)?;
    if marker != unit_name {
        return None;
    }
    Some(AssetStub {
        index: entry.get("index").and_then(Value::as_u64)?,
        name: params.get("name").and_then(Value::as_str).map(str::to_string),
        unit_name: Some(marker.to_string()),
        total: params.get("total").and_then(Value::as_u64),
        params: params.clone(),
    })
}
