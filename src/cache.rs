use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Duration, Utc};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::Asset;
use crate::error::GalleryError;

const ASSETS_FILE: &str = "assets.json";
const INITIAL_LOAD_MARKER: &str = "initial-load";

/// Durable cache for the aggregated asset collection, keyed by a single
/// fixed entry. A read is fresh iff `now - fetched_at < ttl`; stale entries
/// are treated as absent and the pipeline re-fetches everything.
#[derive(Debug, Clone)]
pub struct AssetCache {
    root: Utf8PathBuf,
    ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    assets: Vec<Asset>,
}

impl AssetCache {
    pub fn new(ttl_secs: u64) -> Result<Self, GalleryError> {
        let root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("hodl-gallery"))
                    .ok()
            })
            .ok_or_else(|| {
                GalleryError::Filesystem("unable to resolve cache directory".to_string())
            })?;
        Ok(Self::with_root(root, ttl_secs))
    }

    pub fn with_root(root: Utf8PathBuf, ttl_secs: u64) -> Self {
        Self {
            root,
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn assets_path(&self) -> Utf8PathBuf {
        self.root.join(ASSETS_FILE)
    }

    fn marker_path(&self) -> Utf8PathBuf {
        self.root.join(INITIAL_LOAD_MARKER)
    }

    /// Cached collection, if a fresh entry exists. Unreadable or malformed
    /// entries count as a miss, never an error.
    pub fn get_fresh(&self) -> Option<Vec<Asset>> {
        self.get_fresh_at(Utc::now())
    }

    pub fn get_fresh_at(&self, now: DateTime<Utc>) -> Option<Vec<Asset>> {
        let path = self.assets_path();
        if !path.as_std_path().exists() {
            return None;
        }
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "failed to read asset cache");
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "discarding malformed asset cache entry");
                return None;
            }
        };
        let age = now.signed_duration_since(entry.fetched_at);
        if age < self.ttl {
            debug!(age_secs = age.num_seconds(), "asset cache hit");
            Some(entry.assets)
        } else {
            debug!(age_secs = age.num_seconds(), "asset cache stale");
            None
        }
    }

    /// Full-replacement write: the previous entry is overwritten, never
    /// merged.
    pub fn set(&self, assets: &[Asset]) -> Result<(), GalleryError> {
        self.set_at(assets, Utc::now())
    }

    pub fn set_at(&self, assets: &[Asset], now: DateTime<Utc>) -> Result<(), GalleryError> {
        let entry = CacheEntry {
            fetched_at: now,
            assets: assets.to_vec(),
        };
        let content = serde_json::to_vec_pretty(&entry)
            .map_err(|err| GalleryError::CacheParse(err.to_string()))?;
        self.write_atomic(&self.assets_path(), &content)
    }

    pub fn invalidate(&self) -> Result<(), GalleryError> {
        for path in [self.assets_path(), self.marker_path()] {
            if path.as_std_path().exists() {
                fs::remove_file(path.as_std_path())
                    .map_err(|err| GalleryError::Filesystem(err.to_string()))?;
            }
        }
        Ok(())
    }

    pub fn mark_initial_load(&self) -> Result<(), GalleryError> {
        self.write_atomic(&self.marker_path(), b"true")
    }

    pub fn has_initial_load(&self) -> bool {
        self.marker_path().as_std_path().exists()
    }

    fn write_atomic(&self, path: &Utf8Path, content: &[u8]) -> Result<(), GalleryError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| GalleryError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix("hodl-gallery")
            .tempfile_in(self.root.as_std_path())
            .map_err(|err| GalleryError::Filesystem(err.to_string()))?;
        fs::write(temp.path(), content).map_err(|err| GalleryError::Filesystem(err.to_string()))?;
        if path.as_std_path().exists() {
            fs::remove_file(path.as_std_path())
                .map_err(|err| GalleryError::Filesystem(err.to_string()))?;
        }
        temp.persist(path.as_std_path())
            .map_err(|err| GalleryError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(ttl_secs: u64) -> (tempfile::TempDir, AssetCache) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, AssetCache::with_root(root, ttl_secs))
    }

    #[test]
    fn empty_cache_misses() {
        let (_dir, cache) = temp_cache(300);
        assert!(cache.get_fresh().is_none());
        assert!(!cache.has_initial_load());
    }

    #[test]
    fn invalidate_clears_entry_and_marker() {
        let (_dir, cache) = temp_cache(300);
        cache.set(&[]).unwrap();
        cache.mark_initial_load().unwrap();
        assert!(cache.has_initial_load());

        cache.invalidate().unwrap();
        assert!(cache.get_fresh().is_none());
        assert!(!cache.has_initial_load());
    }
}
