//! Error types for loader construction, fetching and storage.
//!
//! Only [`LoaderError`] ever reaches a caller of the loaders, and only at
//! construction time. Fetch errors are logged by the collector and the
//! affected URL is dropped from the run; store errors are logged by the
//! collection pipeline.

use thiserror::Error;

/// Configuration problems detected while building a [`crate::loaders::WebLoader`].
#[derive(Debug, Error)]
pub enum LoaderError {
    /// A disallowed URL pattern is not a valid regular expression.
    #[error("invalid disallowed url pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A handler was registered with a CSS selector that does not parse.
    #[error("invalid css selector `{0}`: {1}")]
    InvalidSelector(String, String),

    /// The strategy needs a root URL (sitemap or API endpoint) and none was given.
    #[error("the {0} strategy requires a root url")]
    MissingRoot(&'static str),

    /// The root URL could not be parsed.
    #[error("invalid root url `{url}`: {source}")]
    InvalidRoot {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Failure of a single fetch. Never aborts a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("response cache io: {0}")]
    Io(#[from] std::io::Error),

    #[error("response cache entry is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failure of the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization: {0}")]
    Serde(#[from] serde_json::Error),
}
