//! HTTP client wrapper for fetching page images.
//!
//! This module provides the [`PageSource`] seam the fetcher works against and
//! [`HttpClient`], its reqwest-backed implementation. A page fetch is one
//! unauthenticated GET whose body is collected into memory.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;

/// Something that can turn a page URL into raw bytes.
///
/// One call is one attempt; retrying is the fetcher's job.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the full body at `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing why no body was obtained.
    async fn fetch_page(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP client for fetching pages.
///
/// This client is designed to be created once and reused for every page of a
/// run, taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use cookbooker_core::download::{HttpClient, PageSource};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let bytes = client.fetch_page("https://example.com/page.png").await?;
/// println!("fetched {} bytes", bytes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes
    /// - Gzip decompression: enabled
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend cannot be initialised.
    pub fn new_with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(default_user_agent())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpClient {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_page(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let capacity = response
            .content_length()
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0);
        let mut body = Vec::with_capacity(capacity);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    FetchError::timeout(url)
                } else {
                    FetchError::network(url, e)
                }
            })?;
            body.extend_from_slice(&chunk);
        }

        debug!(bytes = body.len(), "page body received");
        Ok(body)
    }
}

fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("cookbooker/{version}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_defaults() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_user_agent_carries_version() {
        let ua = default_user_agent();
        assert!(ua.starts_with("cookbooker/"));
        assert!(ua.ends_with(env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_url() {
        let client = HttpClient::new().unwrap();
        let result = client.fetch_page("not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
