//! Google News sitemaps.
//!
//! Each `<url>` entry carries most of the metadata:
//!
//! ```xml
//! <url>
//!   <loc>https://example.com/story</loc>
//!   <news:news>
//!     <news:publication><news:name>Example</news:name></news:publication>
//!     <news:publication_date>2024-02-26T10:00:00Z</news:publication_date>
//!     <news:title>Story</news:title>
//!     <news:keywords>a, b</news:keywords>
//!   </news:news>
//! </url>
//! ```
//!
//! Entries inside the time window become stubs, and the linked page fills in
//! the body.

use super::{StrategyContext, complete_stub, in_window};
use crate::error::LoaderError;
use crate::models::Document;
use crate::utils::parse_date;
use tracing::debug;

const BODY_SELECTOR: &str = ".ArticleBase-Body, .post, .content, article, body";

/// Comma separated, trimmed, empties dropped.
fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn install(ctx: StrategyContext<'_>) -> Result<(), LoaderError> {
    let StrategyContext {
        collector,
        cache,
        extractor,
        window_days,
        ..
    } = ctx;

    let stubs = cache.clone();
    collector.on_xml("//url", move |entry| {
        let link = entry.child_text("loc");
        let published_at = parse_date(entry.descendant_text("news:publication_date"));
        if !in_window(published_at, window_days) {
            debug!(sitemap = %entry.url(), %link, published_at, "Sitemap entry outside window");
            return;
        }
        if !entry.allows(link) {
            return;
        }
        let stub = Document {
            published_at,
            title: entry.descendant_text("news:title").to_string(),
            source: entry.descendant_text("news:name").to_string(),
            keywords: split_keywords(entry.descendant_text("news:keywords")),
            ..Document::stub(link)
        };
        if stubs.create_if_absent(stub) {
            entry.visit(link);
        }
    });

    collector.on_html(BODY_SELECTOR, move |page| {
        complete_stub(&cache, extractor.as_ref(), page.url(), &page.response.body);
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{LoaderConfig, Strategy};
    use super::*;
    use crate::fetch::testing::StaticFetcher;
    use std::sync::Arc;

    const SITEMAP: &str = "https://news.test/sitemap.xml";

    fn entry(loc: &str, date: &str, title: &str, keywords: &str) -> String {
        format!(
            "<url><loc>{loc}</loc><news:news>\
             <news:publication><news:name>News Test</news:name><news:language>en</news:language></news:publication>\
             <news:publication_date>{date}</news:publication_date>\
             <news:title>{title}</news:title>\
             <news:keywords>{keywords}</news:keywords>\
             </news:news></url>"
        )
    }

    fn sitemap(entries: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:news="http://www.google.com/schemas/sitemap-news/0.9">{}</urlset>"#,
            entries.concat()
        )
    }

    #[test]
    fn test_split_keywords() {
        assert_eq!(split_keywords(" rust, ,async ,"), vec!["rust", "async"]);
        assert!(split_keywords("").is_empty());
    }

    #[tokio::test]
    async fn test_recent_entries_are_stubbed_and_completed() {
        let fresh = days_ago(0);
        let stale = days_ago(10);
        let fetcher = Arc::new(
            StaticFetcher::new()
                .with_xml(
                    SITEMAP,
                    &sitemap(&[
                        entry("https://news.test/fresh", &fresh, "Fresh", "rust, tokio"),
                        entry("https://news.test/stale", &stale, "Stale", ""),
                        entry("https://news.test/chart.png", &fresh, "Chart", ""),
                    ]),
                )
                .with_html("https://news.test/fresh", &article("Page title", "Fresh body")),
        );
        let loader = loader(Strategy::SitemapNews, LoaderConfig::news_sitemap(2, SITEMAP), &fetcher);

        let docs = loader.load_site().await;
        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert_eq!(doc.url, "https://news.test/fresh");
        assert_eq!(doc.title, "Fresh");
        assert_eq!(doc.source, "News Test");
        assert_eq!(doc.keywords, vec!["rust", "tokio"]);
        assert_eq!(doc.text, "Fresh body");
        assert_eq!(doc.published_at, parse_date(&fresh));

        assert_eq!(fetcher.count("https://news.test/stale"), 0);
        assert_eq!(fetcher.count("https://news.test/chart.png"), 0);
    }

    #[tokio::test]
    async fn test_duplicate_entries_make_one_document() {
        let today = days_ago(0);
        let fetcher = Arc::new(
            StaticFetcher::new()
                .with_xml(
                    SITEMAP,
                    &sitemap(&[
                        entry("https://news.test/a", &today, "First", ""),
                        entry("https://news.test/a", &today, "Second", ""),
                    ]),
                )
                .with_html("https://news.test/a", &article("A", "Body")),
        );
        let loader = loader(Strategy::SitemapNews, LoaderConfig::news_sitemap(2, SITEMAP), &fetcher);

        let docs = loader.load_site().await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "First");
        assert_eq!(fetcher.count("https://news.test/a"), 1);
    }

    #[tokio::test]
    async fn test_failed_article_fetch_keeps_stub() {
        let fetcher = Arc::new(StaticFetcher::new().with_xml(
            SITEMAP,
            &sitemap(&[entry("https://news.test/gone", &days_ago(1), "Gone", "")]),
        ));
        let loader = loader(Strategy::SitemapNews, LoaderConfig::news_sitemap(2, SITEMAP), &fetcher);

        let docs = loader.load_site().await;
        assert_eq!(docs.len(), 1);
        assert!(!docs[0].is_completed());
        assert_eq!(docs[0].title, "Gone");
    }

    #[tokio::test]
    async fn test_zero_window_keeps_nothing() {
        let fetcher = Arc::new(StaticFetcher::new().with_xml(
            SITEMAP,
            &sitemap(&[entry("https://news.test/a", &days_ago(0), "A", "")]),
        ));
        let loader = loader(Strategy::SitemapNews, LoaderConfig::news_sitemap(0, SITEMAP), &fetcher);
        assert!(loader.load_site().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_sitemap_yields_nothing() {
        let fetcher = Arc::new(StaticFetcher::new().with_xml(SITEMAP, "<urlset><url><loc>x</url>"));
        let loader = loader(Strategy::SitemapNews, LoaderConfig::news_sitemap(2, SITEMAP), &fetcher);
        assert!(loader.load_site().await.is_empty());
    }
}
