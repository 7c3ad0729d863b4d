//! Main-content extraction from article pages.
//!
//! [`ReadabilityExtractor`] is a lightweight readability pass: it looks for
//! the main content container through an ordered list of well-known
//! selectors, keeps paragraph-level text outside navigation and script
//! noise, and reads the title and publish time from the usual meta tags.

use crate::utils::parse_date;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

/// What an article page yielded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub title: String,
    pub text: String,
    /// Epoch seconds, `0` when the page does not say.
    pub published_at: i64,
}

/// Readability-style content extraction. `None` means the page has no
/// extractable content; callers leave the affected fields unset.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str, base_url: &str) -> Option<Extracted>;
}

fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter().filter_map(|s| Selector::parse(s).ok()).collect()
}

/// Main content containers, most specific first.
static CONTENT_CANDIDATES: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        "[itemprop=articleBody]",
        ".article-content",
        "#article-content",
        ".article-body",
        "#articlebody",
        ".article-text",
        ".article-container",
        "#article-container",
        ".entry-content",
        "#entry-content",
        "article",
        ".post",
        "#post",
        "main",
        ".content",
        "#content",
        "body",
    ])
});

static BLOCKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, h2, h3, h4, li, blockquote, pre").expect("static selector"));

static TITLES: Lazy<Vec<Selector>> =
    Lazy::new(|| selectors(&["meta[property='og:title']", "title", "h1"]));

static PUBLISHED: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        "meta[property='article:published_time']",
        "meta[itemprop=datePublished]",
        "[itemprop=datePublished]",
        "time[datetime]",
    ])
});

const NOISE: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe", "svg",
];

fn is_noise(node: &Node) -> bool {
    node.as_element().is_some_and(|e| NOISE.contains(&e.name()))
}

fn visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            value if is_noise(value) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    out.push(' ');
                    visible_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn normalized(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    visible_text(element, &mut raw);
    raw.split_whitespace().join(" ")
}

fn content_text(candidate: ElementRef<'_>) -> String {
    let blocks = candidate
        .select(&BLOCKS)
        .filter(|block| !block.ancestors().any(|a| is_noise(a.value())))
        .map(normalized)
        .filter(|text| !text.is_empty())
        .join("\n\n");
    if blocks.is_empty() {
        normalized(candidate)
    } else {
        blocks
    }
}

fn title(document: &Html) -> String {
    TITLES
        .iter()
        .filter_map(|sel| document.select(sel).next())
        .map(|el| match el.value().attr("content") {
            Some(content) => content.trim().to_string(),
            None => el.text().join(" ").split_whitespace().join(" "),
        })
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn published_at(document: &Html) -> i64 {
    PUBLISHED
        .iter()
        .flat_map(|sel| document.select(sel))
        .filter_map(|el| {
            let value = el.value();
            value.attr("content").or_else(|| value.attr("datetime"))
        })
        .map(parse_date)
        .find(|ts| *ts != 0)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadabilityExtractor;

impl Extractor for ReadabilityExtractor {
    fn extract(&self, html: &str, base_url: &str) -> Option<Extracted> {
        let document = Html::parse_document(html);

        let text = CONTENT_CANDIDATES
            .iter()
            .filter_map(|sel| document.select(sel).next())
            .map(content_text)
            .find(|text| !text.is_empty());

        let Some(text) = text else {
            debug!(url = %base_url, "No extractable content");
            return None;
        };

        Some(Extracted {
            title: title(&document),
            text,
            published_at: published_at(&document),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<!doctype html>
<html>
<head>
  <title>Fallback title</title>
  <meta property="og:title" content="Rust 2024 ships">
  <meta property="article:published_time" content="2024-02-26T10:00:00Z">
  <script>var tracking = 1;</script>
</head>
<body>
  <nav><p>Home</p><p>World</p></nav>
  <article>
    <h1>Rust 2024 ships</h1>
    <p>The   edition is
       out.</p>
    <aside><p>Related: other news</p></aside>
    <p>Upgrade with <code>cargo fix</code>.</p>
  </article>
  <footer><p>Copyright</p></footer>
</body>
</html>"#;

    #[test]
    fn test_extracts_article_paragraphs() {
        let extracted = ReadabilityExtractor
            .extract(ARTICLE, "https://example.com/rust")
            .unwrap();
        assert_eq!(extracted.title, "Rust 2024 ships");
        assert_eq!(extracted.text, "The edition is out.\n\nUpgrade with cargo fix.");
        assert_eq!(extracted.published_at, 1_708_941_600);
    }

    #[test]
    fn test_falls_back_to_body_text_and_title_tag() {
        let html = "<html><head><title> Plain page </title></head><body><div>Just <b>some</b> text</div><script>x()</script></body></html>";
        let extracted = ReadabilityExtractor.extract(html, "https://example.com").unwrap();
        assert_eq!(extracted.title, "Plain page");
        assert_eq!(extracted.text, "Just some text");
        assert_eq!(extracted.published_at, 0);
    }

    #[test]
    fn test_time_element_publish_date() {
        let html = r#"<html><body><article><time datetime="2024-02-26">Feb 26</time><p>Body</p></article></body></html>"#;
        let extracted = ReadabilityExtractor.extract(html, "https://example.com").unwrap();
        assert_eq!(extracted.published_at, 1_708_905_600);
    }

    #[test]
    fn test_empty_page_is_not_extractable() {
        assert!(ReadabilityExtractor
            .extract("<html><body><script>x()</script></body></html>", "https://example.com")
            .is_none());
        assert!(ReadabilityExtractor.extract("", "https://example.com").is_none());
    }
}
