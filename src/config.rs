use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::GalleryError;

/// Wallet that minted the collection. Every listing run queries this account.
pub const CREATOR_ADDRESS: &str = "PTPAK7NH3KA3D23WBR5GWVS57SO3FCJFBGK2IPDQQFFEXDHO4ENVH65PPM";

/// Unit-name marker distinguishing collection NFTs from the account's other
/// created assets.
pub const UNIT_NAME_MARKER: &str = "HERO";

pub const DEFAULT_INDEXER_BASE_URL: &str = "https://mainnet-api.algonode.cloud";
pub const DEFAULT_METADATA_BASE_URL: &str = "https://mainnet.api.perawallet.app";
pub const DEFAULT_BALANCES_BASE_URL: &str =
    "https://svc.blockdaemon.com/algorand/mainnet/native/indexer/v2";
pub const DEFAULT_NFD_BASE_URL: &str = "https://api.nf.domains";
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.algonode.dev/ipfs/";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

pub const BLOCKDAEMON_API_KEY_VAR: &str = "BLOCKDAEMON_API_KEY";

/// Optional on-disk overrides, `hodl-gallery.json`. Every field falls back to
/// the compiled-in default.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub creator_address: Option<String>,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub indexer_base_url: Option<String>,
    #[serde(default)]
    pub metadata_base_url: Option<String>,
    #[serde(default)]
    pub balances_base_url: Option<String>,
    #[serde(default)]
    pub nfd_base_url: Option<String>,
    #[serde(default)]
    pub ipfs_gateway: Option<String>,
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
    #[serde(default)]
    pub bind_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub creator_address: String,
    pub unit_name: String,
    pub indexer_base_url: String,
    pub metadata_base_url: String,
    pub balances_base_url: String,
    pub nfd_base_url: String,
    pub ipfs_gateway: String,
    pub cache_ttl_secs: u64,
    pub bind_address: String,
    /// Secret; read from the environment, never from the config file.
    pub blockdaemon_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::resolve_file(ConfigFile::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolve the effective configuration. An explicitly given path must
    /// exist; the default `hodl-gallery.json` is optional.
    pub fn resolve(path: Option<&str>) -> Result<Config, GalleryError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("hodl-gallery.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| GalleryError::ConfigRead(config_path.clone()))?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|err| GalleryError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_file(file))
    }

    pub fn resolve_file(file: ConfigFile) -> Config {
        Config {
            creator_address: file
                .creator_address
                .unwrap_or_else(|| CREATOR_ADDRESS.to_string()),
            unit_name: file.unit_name.unwrap_or_else(|| UNIT_NAME_MARKER.to_string()),
            indexer_base_url: file
                .indexer_base_url
                .unwrap_or_else(|| DEFAULT_INDEXER_BASE_URL.to_string()),
            metadata_base_url: file
                .metadata_base_url
                .unwrap_or_else(|| DEFAULT_METADATA_BASE_URL.to_string()),
            balances_base_url: file
                .balances_base_url
                .unwrap_or_else(|| DEFAULT_BALANCES_BASE_URL.to_string()),
            nfd_base_url: file
                .nfd_base_url
                .unwrap_or_else(|| DEFAULT_NFD_BASE_URL.to_string()),
            ipfs_gateway: file
                .ipfs_gateway
                .unwrap_or_else(|| DEFAULT_IPFS_GATEWAY.to_string()),
            cache_ttl_secs: file.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS),
            bind_address: file
                .bind_address
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            blockdaemon_api_key: std::env::var(BLOCKDAEMON_API_KEY_VAR).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve() {
        let config = ConfigLoader::resolve_file(ConfigFile::default());
        assert_eq!(config.creator_address, CREATOR_ADDRESS);
        assert_eq!(config.unit_name, "HERO");
        assert_eq!(config.cache_ttl_secs, 300);
    }

    #[test]
    fn file_overrides_win() {
        let file = ConfigFile {
            unit_name: Some("VILLAIN".to_string()),
            cache_ttl_secs: Some(60),
            ..ConfigFile::default()
        };
        let config = ConfigLoader::resolve_file(file);
        assert_eq!(config.unit_name, "VILLAIN");
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.indexer_base_url, DEFAULT_INDEXER_BASE_URL);
    }
}
