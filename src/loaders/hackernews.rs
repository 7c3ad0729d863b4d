//! Hacker News top stories through the Firebase API.
//!
//! The root lists item ids (`[9129911, 9129199, ...]`); each id is fetched
//! from `item/{id}.json` next to the root. Stories with an external link
//! become documents keyed by that link, so the same article submitted twice
//! is collected once. Text posts, comments and jobs are skipped.

use super::{StrategyContext, complete_stub};
use crate::error::LoaderError;
use crate::models::Document;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

pub const TOP_STORIES: &str = "https://hacker-news.firebaseio.com/v0/topstories.json";
pub const HACKER_NEWS_SOURCE: &str = "YC HACKER NEWS";

const BODY_SELECTOR: &str = ".article-content, #article-content, .article-container, #article-container, \
    [itemprop=articleBody], #articlebody, .article-text, .post, #post, .posts, #posts, \
    .entry-content, #entry-content, .content, #content, article, body";

static ITEM_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.json$").expect("static regex"));

/// The fields of an API item this loader reads.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Item {
    by: String,
    kids: Vec<u64>,
    score: u64,
    time: i64,
    title: String,
    url: String,
    #[serde(rename = "type")]
    kind: String,
}

impl Item {
    fn into_document(self) -> Document {
        Document {
            title: self.title,
            author: self.by,
            published_at: self.time,
            source: HACKER_NEWS_SOURCE.to_string(),
            comment_count: self.kids.len() as u64,
            engagement_score: self.score,
            ..Document::stub(self.url)
        }
    }
}

pub(crate) fn install(ctx: StrategyContext<'_>) -> Result<(), LoaderError> {
    let StrategyContext {
        collector,
        cache,
        extractor,
        root,
        ..
    } = ctx;
    let root = root.ok_or(LoaderError::MissingRoot("hacker-news"))?;
    let item_base = root.join("item/").map_err(|source| LoaderError::InvalidRoot {
        url: root.to_string(),
        source,
    })?;
    let root = root.clone();

    let stubs = cache.clone();
    collector.on_response(move |event| {
        let url = event.url();
        // the request URL is the configured string, which may not be canonical
        if Url::parse(url).is_ok_and(|requested| requested == root) {
            let ids: Vec<u64> = match serde_json::from_str(event.body()) {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(
                        %url,
                        error = %e,
                        body = %truncate_for_log(event.body(), 200),
                        "Top stories listing is not an id array"
                    );
                    return;
                }
            };
            info!(count = ids.len(), "Listed top stories");
            for id in ids {
                event.visit(&format!("{item_base}{id}.json"));
            }
            return;
        }

        let is_item = url
            .strip_prefix(item_base.as_str())
            .is_some_and(|file| ITEM_FILE.is_match(file));
        if !is_item {
            return;
        }
        let item: Item = match serde_json::from_str(event.body()) {
            Ok(item) => item,
            Err(e) => {
                debug!(%url, error = %e, "Unreadable item");
                return;
            }
        };
        if item.kind != "story" || item.url.is_empty() || !event.allows(&item.url) {
            debug!(%url, kind = %item.kind, "Item has no article link");
            return;
        }
        let document = item.into_document();
        let link = document.url.clone();
        if stubs.create_if_absent(document) {
            event.visit(&link);
        }
    });

    collector.on_html(BODY_SELECTOR, move |page| {
        complete_stub(&cache, extractor.as_ref(), page.url(), &page.response.body);
    })
}
