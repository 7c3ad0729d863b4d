//! Storage collaborators for collected beans.
//!
//! The pipeline never knows where beans end up: it is handed a [`BeanStore`]
//! at construction and calls it once per loader run.
//!
//! # Submodules
//!
//! - [`json`]: [`json::JsonFileStore`], pretty JSON files grouped by date
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2024-02-26/
//!     ├── yc-hacker-news-08-00-12.json
//!     └── https-medium-com-sitemap-sitemap-xml-08-00-15.json
//! ```

pub mod json;

use crate::error::StoreError;
use crate::models::Bean;
use async_trait::async_trait;

/// Where beans are persisted.
#[async_trait]
pub trait BeanStore: Send + Sync {
    /// Persist one batch from `source`. Returns how many beans were written.
    async fn store(&self, source: &str, beans: &[Bean]) -> Result<usize, StoreError>;
}
