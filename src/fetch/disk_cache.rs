//! On-disk response cache shared across runs.
//!
//! One JSON file per URL under the cache directory. Entries never expire;
//! clearing the directory is the only invalidation.

use super::FetchResponse;
use crate::error::FetchError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(url)))
    }

    /// Cached response for `url`; misses and unreadable entries are both `None`.
    pub async fn load(&self, url: &str) -> Option<FetchResponse> {
        let raw = fs::read(self.path_for(url)).await.ok()?;
        match serde_json::from_slice::<FetchResponse>(&raw) {
            Ok(response) => {
                debug!(%url, "Response cache hit");
                Some(response)
            }
            Err(e) => {
                debug!(%url, error = %e, "Ignoring corrupt response cache entry");
                None
            }
        }
    }

    pub async fn store(&self, response: &FetchResponse) -> Result<(), FetchError> {
        fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec(response)?;
        fs::write(self.path_for(&response.url), json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("responses"));
        let response = FetchResponse {
            url: "https://example.com/a?b=c".to_string(),
            status: 200,
            content_type: "text/html".to_string(),
            body: "<html></html>".to_string(),
        };

        assert!(cache.load(&response.url).await.is_none());
        cache.store(&response).await.unwrap();
        assert_eq!(cache.load(&response.url).await, Some(response));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let url = "https://example.com/";
        fs::write(cache.path_for(url), b"not json").await.unwrap();
        assert!(cache.load(url).await.is_none());
    }
}
