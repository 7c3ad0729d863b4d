//! In-memory [`Fetcher`] for tests.

use super::{FetchRequest, FetchResponse, Fetcher};
use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves canned responses by exact URL; anything else is a 404.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, (String, String)>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, content_type: &str, body: &str) -> Self {
        self.pages
            .insert(url.to_string(), (content_type.to_string(), body.to_string()));
        self
    }

    pub fn with_html(self, url: &str, body: &str) -> Self {
        self.with(url, "text/html; charset=utf-8", body)
    }

    pub fn with_xml(self, url: &str, body: &str) -> Self {
        self.with(url, "application/xml", body)
    }

    pub fn with_json(self, url: &str, body: &str) -> Self {
        self.with(url, "application/json", body)
    }

    /// Every URL fetched so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requested().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        self.requested.lock().unwrap().push(request.url.clone());
        let (status, content_type, body) = match self.pages.get(&request.url) {
            Some((content_type, body)) => (200, content_type.clone(), body.clone()),
            None => (404, "text/plain".to_string(), String::new()),
        };
        Ok(FetchResponse {
            url: request.url.clone(),
            status,
            content_type,
            body,
        })
    }
}
