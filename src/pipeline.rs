//! Collection pipeline: run every loader, convert, store.
//!
//! Loaders run concurrently and independently. Each finished loader's
//! documents are converted to beans and handed to the [`BeanStore`] under
//! the loader's label; a storage failure is logged and only affects that
//! loader's batch.

use crate::loaders::WebLoader;
use crate::models::to_beans;
use crate::outputs::BeanStore;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Outcome of one loader run.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub label: String,
    pub documents: usize,
    /// Documents whose body was filled in.
    pub completed: usize,
    /// Beans the store accepted; `None` if storing failed.
    pub stored: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionReport {
    pub sources: Vec<SourceReport>,
}

impl CollectionReport {
    pub fn documents(&self) -> usize {
        self.sources.iter().map(|s| s.documents).sum()
    }

    pub fn stored(&self) -> usize {
        self.sources.iter().filter_map(|s| s.stored).sum()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.stored.is_none()).count()
    }
}

pub struct NewsCollector {
    loaders: Vec<WebLoader>,
    store: Arc<dyn BeanStore>,
}

impl NewsCollector {
    pub fn new(loaders: Vec<WebLoader>, store: Arc<dyn BeanStore>) -> Self {
        Self { loaders, store }
    }

    /// Run every loader's `load_site` concurrently and store each result.
    #[instrument(level = "info", skip_all, fields(loaders = self.loaders.len()))]
    pub async fn collect(&self) -> CollectionReport {
        let sources: Vec<SourceReport> = stream::iter(&self.loaders)
            .map(|loader| self.collect_one(loader))
            .buffer_unordered(self.loaders.len().max(1))
            .collect()
            .await;

        let report = CollectionReport { sources };
        info!(
            documents = report.documents(),
            stored = report.stored(),
            failed_sources = report.failed_sources(),
            "Collection finished"
        );
        report
    }

    async fn collect_one(&self, loader: &WebLoader) -> SourceReport {
        let label = loader.label().to_string();
        let documents = loader.load_site().await;
        let completed = documents.iter().filter(|d| d.is_completed()).count();
        info!(
            source = %label,
            window_days = loader.config().time_window_days,
            documents = documents.len(),
            completed,
            "Loader finished"
        );

        let beans = to_beans(&documents);
        let stored = match self.store.store(&label, &beans).await {
            Ok(count) => Some(count),
            Err(e) => {
                error!(source = %label, error = %e, "Failed to store beans");
                None
            }
        };

        SourceReport {
            label,
            documents: documents.len(),
            completed,
            stored,
        }
    }
}
