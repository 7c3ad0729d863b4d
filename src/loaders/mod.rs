//! Source loaders that turn a site into a set of [`Document`]s.
//!
//! A [`WebLoader`] binds one [`Strategy`] to a [`Collector`] and owns the
//! [`DocumentCache`] its handlers fill. Each strategy follows the same
//! discover-then-complete pattern:
//!
//! 1. **Discovery**: a listing (sitemap entry, API response) creates a stub
//!    document keyed by URL and enqueues the article page
//! 2. **Completion**: the article page response fills the stub's body
//!
//! # Supported Sources
//!
//! | Strategy | Module | Topology | Notes |
//! |----------|--------|----------|-------|
//! | Generic HTML | [`html`] | page | One-shot extraction, no stub |
//! | Reddit Link | [`html`] | page | Generic HTML with media hosts filtered out |
//! | Sitemap-News | [`sitemap`] | sitemap → article | Google News sitemap fields |
//! | Medium | [`medium`] | sitemap index → posts sitemap → post | Dates from URL and `lastmod` |
//! | Hacker News | [`hackernews`] | top stories → item → story page | Keyed by story URL, not item id |
//!
//! Malformed listings, failed fetches and pages that do not extract only
//! drop the affected item; `load_site` always returns what was collected.

pub mod cache;
pub mod hackernews;
pub mod html;
pub mod medium;
pub mod sitemap;

use crate::error::LoaderError;
use crate::extract::Extractor;
use crate::fetch::{Collector, CollectorConfig, DEFAULT_PARALLELISM, Fetcher};
use crate::models::Document;
use crate::utils::within_window;
use cache::DocumentCache;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Images, video, audio and PDFs are never article pages.
pub const MEDIA_URL_FILTER: &str = r"(?i)\.(png|jpeg|jpg|gif|webp|mp4|avi|mkv|mp3|wav|pdf)$";

/// Media hosts that Reddit links commonly point to.
pub const REDDIT_MEDIA_HOST_FILTER: &str =
    r"(//v\.redd\.it)|(//i\.redd\.it)|(//www\.reddit\.com/gallery)|(//www\.youtube\.com)";

const NEWS_SITEMAP_TIMEOUT: Duration = Duration::from_secs(10);

/// The traversal a loader runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    GenericHtml,
    SitemapNews,
    Medium,
    HackerNews,
    RedditLink,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::GenericHtml => "generic-html",
            Strategy::SitemapNews => "sitemap-news",
            Strategy::Medium => "medium",
            Strategy::HackerNews => "hacker-news",
            Strategy::RedditLink => "reddit-link",
        }
    }

    fn requires_root(&self) -> bool {
        matches!(
            self,
            Strategy::SitemapNews | Strategy::Medium | Strategy::HackerNews
        )
    }

    fn install(self, ctx: StrategyContext<'_>) -> Result<(), LoaderError> {
        match self {
            Strategy::GenericHtml | Strategy::RedditLink => html::install(ctx),
            Strategy::SitemapNews => sitemap::install(ctx),
            Strategy::Medium => medium::install(ctx),
            Strategy::HackerNews => hackernews::install(ctx),
        }
    }
}

/// What a strategy gets to wire its handlers.
pub(crate) struct StrategyContext<'a> {
    pub collector: &'a mut Collector,
    pub cache: DocumentCache,
    pub extractor: Arc<dyn Extractor>,
    pub window_days: u32,
    pub root: Option<&'a Url>,
}

/// Per-loader configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Sitemap or API entry point; `None` for ad hoc page lookups.
    pub root_url: Option<String>,
    pub time_window_days: u32,
    /// Regular expressions; matching URLs are never visited.
    pub disallowed_url_patterns: Vec<String>,
    pub allow_revisit: bool,
    pub timeout: Option<Duration>,
    /// Directory for the on-disk response cache.
    pub cache_dir: Option<PathBuf>,
    pub parallelism: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            root_url: None,
            time_window_days: 0,
            disallowed_url_patterns: Vec::new(),
            allow_revisit: false,
            timeout: None,
            cache_dir: None,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl LoaderConfig {
    /// Ad hoc article pages.
    pub fn web_text() -> Self {
        Self::default()
    }

    /// Pages linked from Reddit posts.
    pub fn reddit_link() -> Self {
        Self {
            disallowed_url_patterns: vec![
                MEDIA_URL_FILTER.to_string(),
                REDDIT_MEDIA_HOST_FILTER.to_string(),
            ],
            ..Self::default()
        }
    }

    /// A Google News sitemap, keeping entries from the last `days` days.
    pub fn news_sitemap(days: u32, sitemap_url: impl Into<String>) -> Self {
        Self {
            root_url: Some(sitemap_url.into()),
            time_window_days: days,
            disallowed_url_patterns: vec![MEDIA_URL_FILTER.to_string()],
            // sections of one sitemap legitimately overlap
            allow_revisit: true,
            timeout: Some(NEWS_SITEMAP_TIMEOUT),
            ..Self::default()
        }
    }

    /// Medium posts modified in the last `days` days.
    pub fn medium(days: u32) -> Self {
        Self {
            root_url: Some(medium::MEDIUM_SITEMAP.to_string()),
            time_window_days: days,
            disallowed_url_patterns: vec![MEDIA_URL_FILTER.to_string()],
            allow_revisit: true,
            ..Self::default()
        }
    }

    /// Current Hacker News top stories.
    pub fn hacker_news() -> Self {
        Self {
            root_url: Some(hackernews::TOP_STORIES.to_string()),
            disallowed_url_patterns: vec![MEDIA_URL_FILTER.to_string()],
            allow_revisit: true,
            ..Self::default()
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        if timeout.is_some() {
            self.timeout = timeout;
        }
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }
}

/// Dated strategies keep an item only inside a non-empty window.
pub(crate) fn in_window(timestamp: i64, window_days: u32) -> bool {
    window_days > 0 && within_window(timestamp, window_days)
}

/// Completion step shared by the two-phase strategies: fill the stub for
/// `url` from the article page. Unknown URLs and completed stubs are left
/// alone; a page that does not extract leaves the stub without text.
pub(crate) fn complete_stub(cache: &DocumentCache, extractor: &dyn Extractor, url: &str, html: &str) {
    if !cache.get(url).is_some_and(|doc| !doc.is_completed()) {
        return;
    }
    let Some(extracted) = extractor.extract(html, url) else {
        debug!(%url, "Article body not extractable; keeping stub");
        return;
    };
    cache.update(url, |doc| {
        if doc.text.is_empty() {
            doc.text = extracted.text;
        }
        if doc.title.is_empty() {
            doc.title = extracted.title;
        }
        if doc.published_at == 0 {
            doc.published_at = extracted.published_at;
        }
    });
}

/// One source: a strategy, its configuration, and the documents it found.
pub struct WebLoader {
    strategy: Strategy,
    config: LoaderConfig,
    cache: DocumentCache,
    collector: Collector,
}

impl WebLoader {
    /// Build a loader and install its strategy.
    ///
    /// # Errors
    ///
    /// Returns a [`LoaderError`] if a disallowed pattern is not a valid
    /// regular expression, or if the strategy needs a root URL and the
    /// configuration has none or an unparseable one.
    pub fn new(
        strategy: Strategy,
        config: LoaderConfig,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Self, LoaderError> {
        let disallowed = config
            .disallowed_url_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| LoaderError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let root = match &config.root_url {
            Some(url) => Some(Url::parse(url).map_err(|source| LoaderError::InvalidRoot {
                url: url.clone(),
                source,
            })?),
            None if strategy.requires_root() => {
                return Err(LoaderError::MissingRoot(strategy.name()));
            }
            None => None,
        };

        let mut collector = Collector::new(
            fetcher,
            CollectorConfig {
                disallowed,
                allow_revisit: config.allow_revisit,
                timeout: config.timeout,
                cache_dir: config.cache_dir.clone(),
                parallelism: config.parallelism,
            },
        );
        let cache = DocumentCache::new();
        strategy.install(StrategyContext {
            collector: &mut collector,
            cache: cache.clone(),
            extractor,
            window_days: config.time_window_days,
            root: root.as_ref(),
        })?;

        Ok(Self {
            strategy,
            config,
            cache,
            collector,
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Label for logs and storage: the root URL, or the strategy name.
    pub fn label(&self) -> &str {
        self.config
            .root_url
            .as_deref()
            .unwrap_or_else(|| self.strategy.name())
    }

    /// Traverse from the root until every transitively enqueued fetch has
    /// completed, then return everything collected.
    ///
    /// Meant to run once per loader: the cache is not cleared, so a second
    /// call returns the first call's documents plus anything new.
    #[instrument(level = "info", skip_all, fields(strategy = self.strategy.name(), root = ?self.config.root_url))]
    pub async fn load_site(&self) -> Vec<Document> {
        if let Some(root) = &self.config.root_url {
            self.collector.visit(root);
        }
        self.collector.wait().await;
        let docs = self.list_all();
        info!(count = docs.len(), "Site loaded");
        docs
    }

    /// Load one page on this loader's cache, fetching only if it is not
    /// already known.
    #[instrument(level = "info", skip(self))]
    pub async fn load_document(&self, url: &str) -> Option<Document> {
        if !self.cache.exists(url) {
            self.collector.visit(url);
            self.collector.wait().await;
        }
        self.get(url)
    }

    pub fn get(&self, url: &str) -> Option<Document> {
        self.cache.get(url)
    }

    pub fn list_all(&self) -> Vec<Document> {
        self.cache.list_all()
    }
}
