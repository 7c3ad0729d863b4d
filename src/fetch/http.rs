//! [`Fetcher`] backed by `reqwest`.
//!
//! Each request picks a random desktop user agent; some news sites serve
//! stripped pages or 403s to a fixed crawler signature.

use super::{FetchRequest, FetchResponse, Fetcher};
use crate::error::FetchError;
use async_trait::async_trait;
use rand::{Rng, rng};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use tracing::{debug, instrument};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

fn random_user_agent() -> &'static str {
    USER_AGENTS[rng().random_range(0..USER_AGENTS.len())]
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(url = %request.url))]
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let mut builder = self
            .client
            .get(&request.url)
            .header(USER_AGENT, random_user_agent());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;
        debug!(status, %content_type, bytes = body.len(), "Fetched");

        Ok(FetchResponse {
            url: request.url.clone(),
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent_is_known() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }
}
