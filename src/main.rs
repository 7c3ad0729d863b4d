//! # News Collector
//!
//! Collects articles and posts from heterogeneous web sources into a uniform
//! document record and stores them as JSON bean batches.
//!
//! ## Sources
//!
//! - Google News sitemaps (`--sitemap`)
//! - Medium, through its dated two-level sitemap (`--medium`)
//! - Hacker News top stories, through the Firebase API (`--hacker-news`)
//! - Ad hoc article pages (`--url`) and Reddit-linked pages (`--reddit-link`)
//!
//! ## Usage
//!
//! ```sh
//! news_collector -o ./beans --hacker-news --medium --window-days 2
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: each loader walks its listing and creates stub documents
//! 2. **Completion**: article pages fill in the stubs' bodies
//! 3. **Storage**: documents become beans, written once per source

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod error;
mod extract;
mod fetch;
mod loaders;
mod models;
mod outputs;
mod pipeline;
mod utils;

use cli::Cli;
use extract::{Extractor, ReadabilityExtractor};
use fetch::Fetcher;
use fetch::http::HttpFetcher;
use loaders::{LoaderConfig, Strategy, WebLoader};
use models::to_beans;
use outputs::BeanStore;
use outputs::json::JsonFileStore;
use pipeline::NewsCollector;
use utils::ensure_writable_dir;

/// Apply the run-wide CLI settings to a preset.
fn tuned(config: LoaderConfig, args: &Cli) -> LoaderConfig {
    config
        .with_cache_dir(args.cache_dir.clone())
        .with_timeout(args.timeout())
        .with_parallelism(args.parallelism)
}

/// Loaders for every site-level source requested on the command line.
fn site_loaders(
    args: &Cli,
    fetcher: &Arc<dyn Fetcher>,
    extractor: &Arc<dyn Extractor>,
) -> Result<Vec<WebLoader>, error::LoaderError> {
    let mut sources: Vec<(Strategy, LoaderConfig)> = args
        .sitemaps
        .iter()
        .map(|url| {
            (
                Strategy::SitemapNews,
                LoaderConfig::news_sitemap(args.window_days, url.as_str()),
            )
        })
        .collect();
    if args.medium {
        sources.push((Strategy::Medium, LoaderConfig::medium(args.window_days)));
    }
    if args.hacker_news {
        sources.push((Strategy::HackerNews, LoaderConfig::hacker_news()));
    }

    sources
        .into_iter()
        .map(|(strategy, config)| {
            WebLoader::new(strategy, tuned(config, args), fetcher.clone(), extractor.clone())
        })
        .collect()
}

/// Extract ad hoc pages with one loader and store them as a single batch.
#[instrument(level = "info", skip_all, fields(strategy = loader.strategy().name(), count = urls.len()))]
async fn collect_pages(loader: &WebLoader, urls: &[String], store: &dyn BeanStore) {
    let mut documents = Vec::new();
    for url in urls {
        match loader.load_document(url).await {
            Some(doc) => documents.push(doc),
            None => warn!(%url, "No article extracted"),
        }
    }
    info!(extracted = documents.len(), "Pages loaded");

    if let Err(e) = store.store(loader.label(), &to_beans(&documents)).await {
        error!(error = %e, "Failed to store pages");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_collector starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if !args.has_work() {
        warn!("No sources requested; pass --sitemap, --medium, --hacker-news, --url or --reddit-link");
        return Ok(());
    }

    // Early check: ensure the output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }
    if let Some(cache_dir) = &args.cache_dir {
        info!(path = %cache_dir.display(), "Caching responses");
    }

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
    let extractor: Arc<dyn Extractor> = Arc::new(ReadabilityExtractor);
    let store: Arc<dyn BeanStore> = Arc::new(JsonFileStore::new(&args.output_dir));

    // ---- Site sources ----
    let loaders = site_loaders(&args, &fetcher, &extractor)?;
    if !loaders.is_empty() {
        let report = NewsCollector::new(loaders, store.clone()).collect().await;
        for source in &report.sources {
            info!(
                source = %source.label,
                documents = source.documents,
                completed = source.completed,
                stored = ?source.stored,
                "Source summary"
            );
        }
    }

    // ---- Ad hoc pages ----
    let pages = [
        (Strategy::GenericHtml, LoaderConfig::web_text(), &args.urls),
        (Strategy::RedditLink, LoaderConfig::reddit_link(), &args.reddit_links),
    ];
    for (strategy, config, urls) in pages {
        if urls.is_empty() {
            continue;
        }
        let loader = WebLoader::new(strategy, tuned(config, &args), fetcher.clone(), extractor.clone())?;
        collect_pages(&loader, urls, store.as_ref()).await;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
