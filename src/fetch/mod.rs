//! Event-driven fetch engine that source strategies plug into.
//!
//! A [`Collector`] is configured once, gets its handlers registered, and is
//! then driven with [`Collector::visit`] followed by [`Collector::wait`].
//! Handlers run on the fetch task for every response they match and may
//! enqueue further visits, so a single root visit can fan out through
//! sitemap indexes, API listings and article pages before `wait` returns.
//!
//! # Handler kinds
//!
//! | Registration | Runs for | Once per |
//! |--------------|----------|----------|
//! | [`Collector::on_response`] | every successful response | response |
//! | [`Collector::on_html`] | HTML responses | element matching the CSS selector |
//! | [`Collector::on_xml`] | XML responses | element matching the path |
//!
//! Failed requests, non-2xx statuses and malformed XML never reach a
//! handler; they are logged and the URL is dropped from the run.

pub mod disk_cache;
pub mod http;
#[cfg(test)]
pub mod testing;
pub mod xml;

use crate::error::{FetchError, LoaderError};
use async_trait::async_trait;
use dashmap::DashSet;
use disk_cache::DiskCache;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};
use xml::{XmlNode, XmlPath};

/// Default number of requests a collector keeps in flight.
pub const DEFAULT_PARALLELISM: usize = 8;

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub timeout: Option<Duration>,
}

/// A fetched resource. `url` is the URL that was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_html(&self) -> bool {
        self.content_type.contains("html")
    }

    pub fn is_xml(&self) -> bool {
        self.content_type.contains("xml") || self.body.trim_start().starts_with("<?xml")
    }
}

/// The transport under a [`Collector`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// Visit policy and limits of one collector.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// URLs matching any of these are never fetched.
    pub disallowed: Vec<Regex>,
    /// Fetch a URL again even if this collector already visited it.
    pub allow_revisit: bool,
    pub timeout: Option<Duration>,
    pub cache_dir: Option<PathBuf>,
    pub parallelism: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            disallowed: Vec::new(),
            allow_revisit: false,
            timeout: None,
            cache_dir: None,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

struct VisitPolicy {
    disallowed: Vec<Regex>,
    allow_revisit: bool,
    visited: DashSet<String>,
}

/// Enqueues fetches into the run that owns it.
///
/// Handed to every handler so that handlers can fan out.
#[derive(Clone)]
pub struct Visitor {
    policy: Arc<VisitPolicy>,
    queue: mpsc::UnboundedSender<String>,
}

impl Visitor {
    /// Whether `url` passes the static filters: absolute http(s) and not
    /// disallowed. Says nothing about revisits.
    pub fn allows(&self, url: &str) -> bool {
        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => {
                debug!(%url, "Skipping non-http url");
                return false;
            }
        }
        if self.policy.disallowed.iter().any(|re| re.is_match(url)) {
            debug!(%url, "Skipping disallowed url");
            return false;
        }
        true
    }

    /// Enqueue `url`. Returns `false` when the URL is rejected: not absolute
    /// http(s), disallowed, or already visited without revisits allowed.
    pub fn visit(&self, url: &str) -> bool {
        if !self.allows(url) {
            return false;
        }
        if !self.policy.visited.insert(url.to_string()) && !self.policy.allow_revisit {
            debug!(%url, "Skipping already visited url");
            return false;
        }
        self.queue.send(url.to_string()).is_ok()
    }
}

/// A successful response, as seen by `on_response` handlers.
pub struct ResponseEvent<'a> {
    pub response: &'a FetchResponse,
    visitor: &'a Visitor,
}

impl ResponseEvent<'_> {
    pub fn url(&self) -> &str {
        &self.response.url
    }

    pub fn body(&self) -> &str {
        &self.response.body
    }

    pub fn allows(&self, url: &str) -> bool {
        self.visitor.allows(url)
    }

    pub fn visit(&self, url: &str) -> bool {
        self.visitor.visit(url)
    }
}

/// One element of an HTML response matching a handler's selector.
pub struct HtmlElement<'a> {
    pub element: ElementRef<'a>,
    pub response: &'a FetchResponse,
}

impl HtmlElement<'_> {
    pub fn url(&self) -> &str {
        &self.response.url
    }
}

/// One element of an XML response matching a handler's path.
pub struct XmlElement<'a> {
    pub node: &'a XmlNode,
    response: &'a FetchResponse,
    visitor: &'a Visitor,
}

impl XmlElement<'_> {
    pub fn url(&self) -> &str {
        &self.response.url
    }

    pub fn text(&self) -> &str {
        self.node.text()
    }

    pub fn child_text(&self, name: &str) -> &str {
        self.node.child_text(name)
    }

    pub fn descendant_text(&self, name: &str) -> &str {
        self.node.descendant_text(name)
    }

    pub fn allows(&self, url: &str) -> bool {
        self.visitor.allows(url)
    }

    pub fn visit(&self, url: &str) -> bool {
        self.visitor.visit(url)
    }
}

type ResponseHandler = Arc<dyn Fn(&ResponseEvent<'_>) + Send + Sync>;
type HtmlHandler = Arc<dyn Fn(&HtmlElement<'_>) + Send + Sync>;
type XmlHandler = Arc<dyn Fn(&XmlElement<'_>) + Send + Sync>;

#[derive(Clone, Default)]
struct Handlers {
    response: Vec<ResponseHandler>,
    html: Vec<(Selector, HtmlHandler)>,
    xml: Vec<(XmlPath, XmlHandler)>,
}

/// Everything a fetch task needs; cheap to clone.
#[derive(Clone)]
struct Worker {
    fetcher: Arc<dyn Fetcher>,
    handlers: Arc<Handlers>,
    disk_cache: Option<DiskCache>,
    timeout: Option<Duration>,
    permits: Arc<Semaphore>,
    visitor: Visitor,
}

impl Worker {
    async fn run(self, url: String) {
        let response = {
            let Ok(_permit) = self.permits.acquire().await else {
                return;
            };
            match self.fetch(&url).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(%url, error = %e, "Fetch failed; dropping url");
                    return;
                }
            }
        };
        self.dispatch(&response);
    }

    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        if let Some(cache) = &self.disk_cache {
            if let Some(hit) = cache.load(url).await {
                return Ok(hit);
            }
        }

        let request = FetchRequest {
            url: url.to_string(),
            timeout: self.timeout,
        };
        let response = self.fetcher.fetch(&request).await?;
        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }

        if let Some(cache) = &self.disk_cache {
            if let Err(e) = cache.store(&response).await {
                warn!(%url, dir = %cache.dir().display(), error = %e, "Failed to cache response");
            }
        }
        Ok(response)
    }

    fn dispatch(&self, response: &FetchResponse) {
        let visitor = &self.visitor;

        for handler in &self.handlers.response {
            handler(&ResponseEvent { response, visitor });
        }

        if response.is_html() && !self.handlers.html.is_empty() {
            let document = Html::parse_document(&response.body);
            for (selector, handler) in &self.handlers.html {
                for element in document.select(selector) {
                    handler(&HtmlElement { element, response });
                }
            }
        }

        if response.is_xml() && !self.handlers.xml.is_empty() {
            match XmlNode::parse(&response.body) {
                Ok(root) => {
                    for (path, handler) in &self.handlers.xml {
                        for node in root.select(path) {
                            handler(&XmlElement {
                                node,
                                response,
                                visitor,
                            });
                        }
                    }
                }
                Err(e) => warn!(url = %response.url, error = %e, "Malformed XML; dropping response"),
            }
        }
    }
}

/// Fetch engine bound to one loader.
pub struct Collector {
    worker: Worker,
    queue: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl Collector {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: CollectorConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let visitor = Visitor {
            policy: Arc::new(VisitPolicy {
                disallowed: config.disallowed,
                allow_revisit: config.allow_revisit,
                visited: DashSet::new(),
            }),
            queue: tx,
        };
        Self {
            worker: Worker {
                fetcher,
                handlers: Arc::new(Handlers::default()),
                disk_cache: config.cache_dir.map(DiskCache::new),
                timeout: config.timeout,
                permits: Arc::new(Semaphore::new(
                    config.parallelism.clamp(1, Semaphore::MAX_PERMITS),
                )),
                visitor,
            },
            queue: Mutex::new(rx),
        }
    }

    fn handlers_mut(&mut self) -> &mut Handlers {
        Arc::make_mut(&mut self.worker.handlers)
    }

    pub fn on_response<F>(&mut self, handler: F)
    where
        F: Fn(&ResponseEvent<'_>) + Send + Sync + 'static,
    {
        self.handlers_mut().response.push(Arc::new(handler));
    }

    pub fn on_html<F>(&mut self, selector: &str, handler: F) -> Result<(), LoaderError>
    where
        F: Fn(&HtmlElement<'_>) + Send + Sync + 'static,
    {
        let parsed = Selector::parse(selector)
            .map_err(|e| LoaderError::InvalidSelector(selector.to_string(), e.to_string()))?;
        self.handlers_mut().html.push((parsed, Arc::new(handler)));
        Ok(())
    }

    pub fn on_xml<F>(&mut self, path: &str, handler: F)
    where
        F: Fn(&XmlElement<'_>) + Send + Sync + 'static,
    {
        self.handlers_mut()
            .xml
            .push((XmlPath::parse(path), Arc::new(handler)));
    }

    /// Enqueue a fetch; see [`Visitor::visit`].
    pub fn visit(&self, url: &str) -> bool {
        self.worker.visitor.visit(url)
    }

    /// Run queued fetches until nothing is queued or in flight, including
    /// fetches enqueued by handlers along the way.
    #[instrument(level = "debug", skip_all)]
    pub async fn wait(&self) {
        let mut queue = self.queue.lock().await;
        let mut in_flight = JoinSet::new();
        let mut fetched = 0usize;

        loop {
            while let Ok(url) = queue.try_recv() {
                in_flight.spawn(self.worker.clone().run(url));
            }
            if in_flight.is_empty() {
                break;
            }
            tokio::select! {
                Some(url) = queue.recv() => {
                    in_flight.spawn(self.worker.clone().run(url));
                }
                Some(joined) = in_flight.join_next() => {
                    fetched += 1;
                    if let Err(e) = joined {
                        warn!(error = %e, "Fetch task aborted");
                    }
                }
                else => break,
            }
        }
        debug!(fetched, "Fetch queue drained");
    }
}
