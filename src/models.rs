//! Data models for collected documents and their storage records.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Document`]: the canonical record every source strategy produces
//! - [`Bean`]: the record shape handed to the storage collaborator
//! - [`MediaNoise`]: social engagement attached to a bean when present
//!
//! Empty fields are omitted when serialized, so a stub that never received
//! its body serializes without a `text` key.

use serde::{Deserialize, Serialize};

/// What kind of content a [`Document`] holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Article,
}

/// A collected article or post.
///
/// `url` is the identity: a loader holds at most one `Document` per URL.
/// Discovery creates a stub with the metadata the listing carried, and the
/// body fetch later fills `text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub kind: DocumentKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    /// Epoch seconds, `0` when unknown.
    #[serde(rename = "created", default, skip_serializing_if = "is_zero")]
    pub published_at: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(rename = "comments", default, skip_serializing_if = "is_zero")]
    pub comment_count: u64,
    /// Upvotes, likes or score, whatever the source reports.
    #[serde(rename = "likes", default, skip_serializing_if = "is_zero")]
    pub engagement_score: u64,
}

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

impl Document {
    /// A stub holding only the identity.
    pub fn stub(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Whether the body has been filled in.
    pub fn is_completed(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Host part of a URL, used as the source label for ad hoc pages.
///
/// For example: `"https://www.example.com/a/b"` -> `"www.example.com"`
pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

/// Engagement counters attached to a [`Bean`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaNoise {
    pub bean_url: String,
    pub source: String,
    pub comments: u64,
    pub thumbsup_count: u64,
}

/// Storage record shape for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bean {
    pub url: String,
    pub source: String,
    pub title: String,
    pub kind: DocumentKind,
    pub text: String,
    pub author: String,
    pub created: i64,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_noise: Option<MediaNoise>,
}

impl From<&Document> for Bean {
    fn from(doc: &Document) -> Self {
        let media_noise = (doc.comment_count > 0 || doc.engagement_score > 0).then(|| MediaNoise {
            bean_url: doc.url.clone(),
            source: doc.source.clone(),
            comments: doc.comment_count,
            thumbsup_count: doc.engagement_score,
        });
        Bean {
            url: doc.url.clone(),
            source: doc.source.clone(),
            title: doc.title.clone(),
            kind: doc.kind,
            text: doc.text.clone(),
            author: doc.author.clone(),
            created: doc.published_at,
            keywords: doc.keywords.clone(),
            media_noise,
        }
    }
}

/// Map documents to storage records.
pub fn to_beans(docs: &[Document]) -> Vec<Bean> {
    docs.iter().map(Bean::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story() -> Document {
        Document {
            url: "https://example.com/story".to_string(),
            source: "YC HACKER NEWS".to_string(),
            title: "A story".to_string(),
            author: "pg".to_string(),
            published_at: 1_708_905_600,
            comment_count: 2,
            engagement_score: 5,
            ..Document::default()
        }
    }

    #[test]
    fn test_stub_has_only_identity() {
        let doc = Document::stub("https://example.com");
        assert_eq!(doc.url, "https://example.com");
        assert_eq!(doc.kind, DocumentKind::Article);
        assert!(doc.title.is_empty());
        assert!(!doc.is_completed());
    }

    #[test]
    fn test_document_serialization_omits_empty_fields() {
        let json = serde_json::to_value(Document::stub("https://example.com")).unwrap();
        assert_eq!(json["kind"], "article");
        assert_eq!(json["url"], "https://example.com");
        assert!(json.get("text").is_none());
        assert!(json.get("created").is_none());
        assert!(json.get("keywords").is_none());
    }

    #[test]
    fn test_document_serialization_storage_names() {
        let json = serde_json::to_value(story()).unwrap();
        assert_eq!(json["created"], 1_708_905_600);
        assert_eq!(json["comments"], 2);
        assert_eq!(json["likes"], 5);
    }

    #[test]
    fn test_bean_with_media_noise() {
        let beans = to_beans(&[story()]);
        assert_eq!(beans.len(), 1);
        let noise = beans[0].media_noise.as_ref().unwrap();
        assert_eq!(noise.bean_url, "https://example.com/story");
        assert_eq!(noise.source, "YC HACKER NEWS");
        assert_eq!(noise.comments, 2);
        assert_eq!(noise.thumbsup_count, 5);
        assert_eq!(beans[0].created, 1_708_905_600);
    }

    #[test]
    fn test_bean_without_engagement_has_no_media_noise() {
        let mut doc = story();
        doc.comment_count = 0;
        doc.engagement_score = 0;
        let bean = Bean::from(&doc);
        assert!(bean.media_noise.is_none());
        let json = serde_json::to_value(&bean).unwrap();
        assert!(json.get("media_noise").is_none());
    }

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("https://www.example.com/a/b"),
            Some("www.example.com".to_string())
        );
        assert_eq!(host_of("not a url"), None);
    }
}
