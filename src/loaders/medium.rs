//! Medium, through its two-level sitemap.
//!
//! The root is a sitemap index whose entries are dated, e.g.
//! `https://medium.com/sitemap/posts/2024/posts-2024-02-26.xml`. Only post
//! sitemaps dated inside the window are fetched; their `<url>` entries are
//! filtered again by `lastmod` before the post itself is fetched.

use super::{StrategyContext, complete_stub, in_window};
use crate::error::LoaderError;
use crate::models::Document;
use crate::utils::parse_date;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub const MEDIUM_SITEMAP: &str = "https://medium.com/sitemap/sitemap.xml";
pub const MEDIUM_SOURCE: &str = "MEDIUM";

static SITEMAP_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("static regex"));

/// Date embedded in a post sitemap URL, as epoch seconds (`0` if none).
fn sitemap_date(link: &str) -> i64 {
    SITEMAP_DATE
        .find(link)
        .map(|m| parse_date(m.as_str()))
        .unwrap_or(0)
}

pub(crate) fn install(ctx: StrategyContext<'_>) -> Result<(), LoaderError> {
    let StrategyContext {
        collector,
        cache,
        extractor,
        window_days,
        ..
    } = ctx;

    collector.on_xml("//sitemap/loc", move |loc| {
        let link = loc.text();
        if link.contains("/posts/") && in_window(sitemap_date(link), window_days) {
            loc.visit(link);
        }
    });

    let stubs = cache.clone();
    collector.on_xml("//url", move |entry| {
        let link = entry.child_text("loc");
        let published_at = parse_date(entry.child_text("lastmod"));
        if !in_window(published_at, window_days) || !entry.allows(link) {
            debug!(%link, published_at, "Skipping post");
            return;
        }
        let stub = Document {
            published_at,
            source: MEDIUM_SOURCE.to_string(),
            ..Document::stub(link)
        };
        if stubs.create_if_absent(stub) {
            entry.visit(link);
        }
    });

    collector.on_html("html", move |page| {
        complete_stub(&cache, extractor.as_ref(), page.url(), &page.response.body);
    })
}
