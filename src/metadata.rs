use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::domain::{Asset, AssetId, Collectible, MediaRef, Trait, derive_gem, derive_month, derive_tier};
use crate::error::GalleryError;

/// Fetches one asset's descriptive metadata and derives the display
/// attributes. Single attempt per asset; failures are the caller's problem
/// (the pipeline drops the asset, the route answers 500).
pub trait MetadataClient: Send + Sync {
    fn fetch(&self, id: AssetId) -> impl Future<Output = Result<Asset, GalleryError>> + Send;
}

pub struct PeraHttpClient {
    client: Client,
    base_url: String,
    /// Process-lifetime per-id cache; avoids duplicate fetches within one
    /// session. Not persisted across restarts.
    cache: Mutex<HashMap<u64, Asset>>,
}

impl PeraHttpClient {
    pub fn new(config: &Config) -> Result<Self, GalleryError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("hodl-gallery/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GalleryError::MetadataHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| GalleryError::MetadataHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.metadata_base_url.clone(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn asset_url(&self, id: AssetId) -> String {
        format!("{}/v1/public/assets/{}/", self.base_url, id)
    }

    async fn handle_status(response: reqwest::Response) -> Result<reqwest::Response, GalleryError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "metadata request failed".to_string());
        Err(GalleryError::MetadataStatus { status, message })
    }
}

impl MetadataClient for PeraHttpClient {
    async fn fetch(&self, id: AssetId) -> Result<Asset, GalleryError> {
        if let Some(asset) = self
            .cache
            .lock()
            .expect("metadata cache lock poisoned")
            .get(&id.value())
            .cloned()
        {
            debug!(asset = id.value(), "metadata memory cache hit");
            return Ok(asset);
        }

        let url = self.asset_url(id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| GalleryError::MetadataHttp(err.to_string()))?;
        let response = Self::handle_status(response).await?;
        let raw: Value = response
            .json()
            .await
            .map_err(|err| GalleryError::MetadataHttp(err.to_string()))?;

        let asset = extract_asset(&raw)?;
        self.cache
            .lock()
            .expect("metadata cache lock poisoned")
            .insert(id.value(), asset.clone());
        Ok(asset)
    }
}

fn string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extract_traits(collectible: &Value) -> Vec<Trait> {
    collectible
        .get("traits")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let display_name = entry.get("display_name").and_then(string_value)?;
                    let display_value = entry.get("display_value").and_then(string_value)?;
                    Some(Trait {
                        display_name,
                        display_value,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn extract_collectible(raw: &Value) -> Option<Collectible> {
    let collectible = raw.get("collectible")?;
    if !collectible.is_object() {
        return None;
    }
    Some(Collectible {
        description: collectible
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        traits: extract_traits(collectible),
        metadata_image: collectible
            .get("metadata")
            .and_then(|meta| meta.get("image"))
            .and_then(Value::as_str)
            .map(str::to_string),
        media: collectible
            .get("media")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| MediaRef {
                        url: entry.get("url").and_then(Value::as_str).map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    })
}

/// Build the enriched asset record from the raw metadata payload. Pure;
/// derivation of tier/gem/month happens here and nowhere else.
pub fn extract_asset(raw: &Value) -> Result<Asset, GalleryError> {
    let asset_id = raw
        .get("asset_id")
        .and_then(Value::as_u64)
        .ok_or_else(|| GalleryError::MalformedMetadata("missing asset_id".to_string()))?;

    let collectible = extract_collectible(raw);
    let traits = collectible
        .as_ref()
        .map(|c| c.traits.as_slice())
        .unwrap_or_default();

    let tier = derive_tier(traits);
    let gem_value = derive_gem(traits);
    let month = derive_month(traits);

    let description = raw
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| collectible.as_ref().and_then(|c| c.description.clone()));

    let image_url = raw
        .get("image")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| collectible.as_ref().and_then(|c| c.metadata_image.clone()));

    Ok(Asset {
        asset_id,
        name: raw
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        unit_name: raw
            .get("unit_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        creator_address: raw
            .get("creator_address")
            .and_then(Value::as_str)
            .map(str::to_string),
        total_supply: raw.get("total_supply").and_then(|value| {
            value
                .as_u64()
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        }),
        description,
        collectible,
        tier,
        gem_value,
        month,
        image_url,
        raw_json: raw.clone(),
    })
}
