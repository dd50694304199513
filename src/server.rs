use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::balances::{BalancesClient, BlockdaemonHttpClient};
use crate::config::Config;
use crate::domain::AssetId;
use crate::error::GalleryError;
use crate::metadata::{MetadataClient, PeraHttpClient};
use crate::nfd::{NfdHttpClient, resolve_names};
use crate::tiers::{TIER_DESCRIPTORS, TierDescriptor};

/// Shared clients behind the proxy routes. The server never aggregates;
/// each route is a thin pass through one upstream.
pub struct AppState {
    pub metadata: PeraHttpClient,
    pub balances: BlockdaemonHttpClient,
    pub nfd: NfdHttpClient,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, GalleryError> {
        Ok(Self {
            metadata: PeraHttpClient::new(config)?,
            balances: BlockdaemonHttpClient::new(config)?,
            nfd: NfdHttpClient::new(config)?,
        })
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/asset-details", get(asset_details))
        .route("/api/blockdaemon", get(blockdaemon))
        .route("/api/get-nfds", get(get_nfds))
        .route("/api/tiers", get(tiers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, bind_address: &str) -> Result<(), GalleryError> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|err| GalleryError::Server(err.to_string()))?;
    info!(address = %bind_address, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| GalleryError::Server(err.to_string()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn upstream_failure(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}

fn parse_asset_id(params: &HashMap<String, String>) -> Result<AssetId, (StatusCode, Json<Value>)> {
    let raw = params
        .get("assetId")
        .ok_or_else(|| bad_request("Asset ID is required"))?;
    raw.parse().map_err(|_| bad_request("Invalid asset ID"))
}

/// `GET /api/asset-details?assetId=...`: the merged upstream payload plus
/// the derived display attributes.
async fn asset_details(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let id = match parse_asset_id(&params) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.metadata.fetch(id).await {
        Ok(asset) => {
            let mut merged = asset.raw_json.as_object().cloned().unwrap_or_default();
            merged.insert("tier".to_string(), json!(asset.tier));
            merged.insert("gemValue".to_string(), json!(asset.gem_value));
            merged.insert("month".to_string(), json!(asset.month));
            merged.insert("name".to_string(), json!(asset.name));
            if let Some(image_url) = &asset.image_url {
                merged.insert("image_url".to_string(), json!(image_url));
            }
            if let Some(description) = &asset.description {
                merged.insert("description".to_string(), json!(description));
            }
            (StatusCode::OK, Json(json!({ "asset": Value::Object(merged) })))
        }
        Err(err) => {
            error!(asset = %id, error = %err, "asset details fetch failed");
            upstream_failure("Failed to fetch asset details")
        }
    }
}

/// `GET /api/blockdaemon?assetId=...`: upstream balances JSON, verbatim.
async fn blockdaemon(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let id = match parse_asset_id(&params) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.balances.balances_raw(id).await {
        Ok(raw) => (StatusCode::OK, Json(raw)),
        Err(err) => {
            error!(asset = %id, error = %err, "balances fetch failed");
            upstream_failure("Failed to fetch asset balances")
        }
    }
}

/// `GET /api/get-nfds?addresses=a,b,c`: name records for a comma-separated
/// address list, batched upstream at 10 addresses per request. Failed
/// batches are skipped, so the response carries whatever resolved.
async fn get_nfds(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let Some(addresses) = params.get("addresses") else {
        return bad_request("No addresses provided");
    };

    let address_list: Vec<String> = addresses
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect();
    if address_list.is_empty() {
        return bad_request("No addresses provided");
    }

    let records = resolve_names(&state.nfd, &address_list).await;
    (StatusCode::OK, Json(json!({ "nfds": records })))
}

/// `GET /api/tiers`: static tier descriptors.
async fn tiers() -> Json<&'static [TierDescriptor]> {
    Json(TIER_DESCRIPTORS.as_slice())
}
