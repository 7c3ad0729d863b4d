//! JSON file storage.
//!
//! Each batch becomes one pretty-printed array of beans at
//! `{output_dir}/{YYYY-MM-DD}/{source-slug}-{HH-MM-SS}.json`, using UTC for
//! both the directory and the file time. Empty batches write nothing.

use super::BeanStore;
use crate::error::StoreError;
use crate::models::Bean;
use crate::utils::slugify;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    output_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Where a batch from `source` written at `at` lands.
    pub fn path_for(&self, source: &str, at: DateTime<Utc>) -> PathBuf {
        let slug = match slugify(source) {
            slug if slug.is_empty() => "beans".to_string(),
            slug => slug,
        };
        self.output_dir
            .join(at.format("%Y-%m-%d").to_string())
            .join(format!("{slug}-{}.json", at.format("%H-%M-%S")))
    }
}

#[async_trait]
impl BeanStore for JsonFileStore {
    #[instrument(level = "info", skip_all, fields(%source, count = beans.len()))]
    async fn store(&self, source: &str, beans: &[Bean]) -> Result<usize, StoreError> {
        if beans.is_empty() {
            info!("Nothing to store");
            return Ok(0);
        }

        let json = serde_json::to_string_pretty(beans)?;
        let path = self.path_for(source, Utc::now());
        if let Some(dir) = path.parent() {
            if let Err(e) = fs::create_dir_all(dir).await {
                error!(dir = %dir.display(), error = %e, "Failed to create output dir");
                return Err(e.into());
            }
        }

        fs::write(&path, json).await?;
        info!(path = %path.display(), "Wrote beans");
        Ok(beans.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, to_beans};
    use chrono::TimeZone;

    #[test]
    fn test_path_layout() {
        let store = JsonFileStore::new("/out");
        let at = Utc.with_ymd_and_hms(2024, 2, 26, 8, 5, 9).unwrap();
        assert_eq!(
            store.path_for("YC HACKER NEWS", at),
            PathBuf::from("/out/2024-02-26/yc-hacker-news-08-05-09.json")
        );
        assert_eq!(
            store.path_for("", at),
            PathBuf::from("/out/2024-02-26/beans-08-05-09.json")
        );
    }

    #[tokio::test]
    async fn test_store_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut doc = Document::stub("https://a.test/");
        doc.title = "A".to_string();
        doc.engagement_score = 3;

        let written = store.store("MEDIUM", &to_beans(&[doc])).await.unwrap();
        assert_eq!(written, 1);

        let day = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
        let file = std::fs::read_dir(day.path()).unwrap().next().unwrap().unwrap();
        assert!(file.file_name().to_string_lossy().starts_with("medium-"));

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains('\n'));
        let beans: Vec<Bean> = serde_json::from_str(&raw).unwrap();
        assert_eq!(beans[0].title, "A");
        assert_eq!(beans[0].media_noise.as_ref().unwrap().thumbsup_count, 3);
    }

    #[tokio::test]
    async fn test_empty_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert_eq!(store.store("MEDIUM", &[]).await.unwrap(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
