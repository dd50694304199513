use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::warn;

use crate::config::Config;
use crate::domain::{AssetId, Holder};
use crate::error::GalleryError;

/// Current holder balances for one asset, straight from the ledger indexer.
/// Errors surface as `Err` so consumers can tell "fetch failed" apart from
/// "still fetching" and "fetched, empty".
pub trait BalancesClient: Send + Sync {
    fn balances_raw(&self, id: AssetId) -> impl Future<Output = Result<Value, GalleryError>> + Send;

    fn holders(&self, id: AssetId) -> impl Future<Output = Result<Vec<Holder>, GalleryError>> + Send;
}

pub struct BlockdaemonHttpClient {
    client: Client,
    base_url: String,
}

impl BlockdaemonHttpClient {
    pub fn new(config: &Config) -> Result<Self, GalleryError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("hodl-gallery/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GalleryError::BalancesHttp(err.to_string()))?,
        );
        match config.blockdaemon_api_key.as_deref() {
            Some(key) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|err| GalleryError::BalancesHttp(err.to_string()))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            None => warn!("BLOCKDAEMON_API_KEY not set; balance queries will be rejected upstream"),
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| GalleryError::BalancesHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.balances_base_url.clone(),
        })
    }

    fn balances_url(&self, id: AssetId) -> String {
        format!("{}/assets/{}/balances", self.base_url, id)
    }

    async fn handle_status(response: reqwest::Response) -> Result<reqwest::Response, GalleryError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "balances request failed".to_string());
        Err(GalleryError::BalancesStatus { status, message })
    }
}

impl BalancesClient for BlockdaemonHttpClient {
    async fn balances_raw(&self, id: AssetId) -> Result<Value, GalleryError> {
        let url = self.balances_url(id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| GalleryError::BalancesHttp(err.to_string()))?;
        let response = Self::handle_status(response).await?;
        response
            .json()
            .await
            .map_err(|err| GalleryError::BalancesHttp(err.to_string()))
    }

    async fn holders(&self, id: AssetId) -> Result<Vec<Holder>, GalleryError> {
        let raw = self.balances_raw(id).await?;
        Ok(parse_holders(&raw))
    }
}

/// Holders with a positive balance, in upstream order. Consumers needing a
/// deterministic order sort client-side (see `grouping::sort_holders`).
pub fn parse_holders(raw: &Value) -> Vec<Holder> {
    raw.get("balances")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let address = entry.get("address").and_then(Value::as_str)?;
                    let amount = entry.get("amount").and_then(Value::as_u64)?;
                    if amount == 0 {
                        return None;
                    }
                    Some(Holder {
                        address: address.to_string(),
                        amount,
                        nfd: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_holders_drops_zero_balances() {
        let raw = json!({
            "balances": [
                {"address": "AAA", "amount": 2},
                {"address": "BBB", "amount": 0},
                {"address": "CCC", "amount": 1},
                {"amount": 5}
            ]
        });
        let holders = parse_holders(&raw);
        assert_eq!(holders.len(), 2);
        assert_eq!(holders[0].address, "AAA");
        assert_eq!(holders[1].address, "CCC");
    }

    #[test]
    fn parse_holders_tolerates_missing_array() {
        assert!(parse_holders(&json!({})).is_empty());
    }
}
