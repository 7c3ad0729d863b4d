//! Generic article pages.
//!
//! Used for ad hoc URLs and for pages linked from Reddit posts. There is no
//! discovery phase: the requested page is extracted in one shot and the
//! document is created only if extraction yields text.

use super::StrategyContext;
use crate::error::LoaderError;
use crate::models::host_of;
use tracing::{debug, info};

pub(crate) fn install(ctx: StrategyContext<'_>) -> Result<(), LoaderError> {
    let StrategyContext {
        collector,
        cache,
        extractor,
        ..
    } = ctx;

    collector.on_html("html", move |page| {
        let url = page.url();
        let Some(extracted) = extractor.extract(&page.element.html(), url) else {
            debug!(%url, "Page yielded no article");
            return;
        };
        if cache.get_or_create(url).is_completed() {
            return;
        }
        info!(%url, chars = extracted.text.len(), "Extracted page");
        cache.update(url, |doc| {
            doc.source = host_of(url).unwrap_or_default();
            doc.title = extracted.title;
            doc.text = extracted.text;
            doc.published_at = extracted.published_at;
        });
    })
}
