use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::Holder;
use crate::error::GalleryError;

/// Upstream rejects larger address batches; chosen empirically.
pub const NFD_BATCH_SIZE: usize = 10;

/// One upstream lookup call for up to `NFD_BATCH_SIZE` addresses.
/// Deduplication is the caller's responsibility.
pub trait NfdClient: Send + Sync {
    fn lookup_batch(
        &self,
        addresses: &[String],
    ) -> impl Future<Output = Result<HashMap<String, Value>, GalleryError>> + Send;
}

/// Resolve names for a set of addresses, batching sequentially at
/// `NFD_BATCH_SIZE` per request. A failed batch is skipped (its addresses
/// stay unresolved) rather than aborting the whole resolution.
pub async fn resolve_names<C: NfdClient>(
    client: &C,
    addresses: &[String],
) -> HashMap<String, Value> {
    let mut resolved = HashMap::new();
    for batch in addresses.chunks(NFD_BATCH_SIZE) {
        match client.lookup_batch(batch).await {
            Ok(records) => resolved.extend(records),
            Err(err) => {
                warn!(batch_len = batch.len(), error = %err, "skipping failed NFD batch");
            }
        }
    }
    debug!(
        requested = addresses.len(),
        resolved = resolved.len(),
        "NFD resolution finished"
    );
    resolved
}

/// Human-readable name out of a raw NFD record.
pub fn display_name(record: &Value) -> Option<&str> {
    record.get("name").and_then(Value::as_str)
}

/// Attach resolved names to holders in place; unresolved holders keep
/// `nfd: None`.
pub fn apply_names(holders: &mut [Holder], records: &HashMap<String, Value>) {
    for holder in holders {
        holder.nfd = records
            .get(&holder.address)
            .and_then(display_name)
            .map(str::to_string);
    }
}

pub struct NfdHttpClient {
    client: Client,
    base_url: String,
}

impl NfdHttpClient {
    pub fn new(config: &Config) -> Result<Self, GalleryError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("hodl-gallery/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GalleryError::NfdHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| GalleryError::NfdHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.nfd_base_url.clone(),
        })
    }

    fn lookup_url(&self, addresses: &[String]) -> String {
        let query: Vec<String> = addresses
            .iter()
            .map(|address| format!("address={address}"))
            .collect();
        format!("{}/nfd/lookup?{}", self.base_url, query.join("&"))
    }

    async fn handle_status(response: reqwest::Response) -> Result<reqwest::Response, GalleryError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "NFD request failed".to_string());
        Err(GalleryError::NfdStatus { status, message })
    }
}

impl NfdClient for NfdHttpClient {
    async fn lookup_batch(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, Value>, GalleryError> {
        let url = self.lookup_url(addresses);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| GalleryError::NfdHttp(err.to_string()))?;
        let response = Self::handle_status(response).await?;
        let raw: Value = response
            .json()
            .await
            .map_err(|err| GalleryError::NfdHttp(err.to_string()))?;

        let records = raw
            .as_object()
            .ok_or_else(|| GalleryError::NfdHttp("unexpected lookup response structure".to_string()))?
            .iter()
            .map(|(address, record)| (address.clone(), record.clone()))
            .collect();
        Ok(records)
    }
}
