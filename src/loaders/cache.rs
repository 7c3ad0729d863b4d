//! Per-loader document store keyed by URL.
//!
//! Every discovery path goes through [`DocumentCache::create_if_absent`] or
//! [`DocumentCache::get_or_create`], which are atomic per URL, so however
//! many sitemap sections or API listings mention a URL, one document exists
//! for it.

use crate::models::Document;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Cloneable handle; clones share the same map. Only the owning loader and
/// the handlers it installs hold clones.
#[derive(Debug, Clone, Default)]
pub struct DocumentCache {
    documents: Arc<DashMap<String, Document>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, url: &str) -> bool {
        self.documents.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<Document> {
        self.documents.get(url).map(|doc| doc.value().clone())
    }

    /// The document for `url`, installing an empty stub first if needed.
    pub fn get_or_create(&self, url: &str) -> Document {
        self.documents
            .entry(url.to_string())
            .or_insert_with(|| Document::stub(url))
            .value()
            .clone()
    }

    /// Install `document` unless its URL is already present. Returns whether
    /// this call created the entry.
    pub fn create_if_absent(&self, document: Document) -> bool {
        match self.documents.entry(document.url.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(document);
                true
            }
        }
    }

    /// Mutate the document for `url` in place. Returns `false` if absent.
    pub fn update<F>(&self, url: &str, f: F) -> bool
    where
        F: FnOnce(&mut Document),
    {
        match self.documents.get_mut(url) {
            Some(mut doc) => {
                f(&mut doc);
                true
            }
            None => false,
        }
    }

    /// Every document, in no particular order.
    pub fn list_all(&self) -> Vec<Document> {
        self.documents.iter().map(|entry| entry.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_installs_stub_once() {
        let cache = DocumentCache::new();
        assert!(!cache.exists("https://a"));
        assert!(cache.get("https://a").is_none());

        let stub = cache.get_or_create("https://a");
        assert_eq!(stub, Document::stub("https://a"));
        assert!(cache.exists("https://a"));

        cache.update("https://a", |doc| doc.title = "A".to_string());
        assert_eq!(cache.get_or_create("https://a").title, "A");
        assert_eq!(cache.list_all().len(), 1);
    }

    #[test]
    fn test_create_if_absent_keeps_first() {
        let cache = DocumentCache::new();
        let mut first = Document::stub("https://a");
        first.title = "first".to_string();
        let mut second = Document::stub("https://a");
        second.title = "second".to_string();

        assert!(cache.create_if_absent(first));
        assert!(!cache.create_if_absent(second));
        assert_eq!(cache.get("https://a").unwrap().title, "first");
    }

    #[test]
    fn test_update_missing_is_noop() {
        let cache = DocumentCache::new();
        assert!(!cache.update("https://a", |doc| doc.text = "x".to_string()));
        assert!(cache.list_all().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let cache = DocumentCache::new();
        let handle = cache.clone();
        handle.create_if_absent(Document::stub("https://a"));
        handle.get_or_create("https://b");
        let mut urls: Vec<_> = cache.list_all().into_iter().map(|d| d.url).collect();
        urls.sort();
        assert_eq!(urls, vec!["https://a", "https://b"]);
    }

    #[test]
    fn test_concurrent_discovery_creates_one_document() {
        let cache = DocumentCache::new();
        let created: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let cache = cache.clone();
                    scope.spawn(move || cache.create_if_absent(Document::stub("https://a")) as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(created, 1);
        assert_eq!(cache.list_all().len(), 1);
    }
}
