//! HTTP retrieval of raw feed documents.
//!
//! Thin collaborator around the core: fetches every blogroll URL with
//! bounded concurrency and hands raw bytes back in input order. A
//! failed fetch is a per-feed outcome, never a batch failure — the
//! caller logs it and treats that feed as empty for the run.

use futures::stream::{self, StreamExt};
use std::time::Duration;
use thiserror::Error;

/// Sent with every request so feed operators can identify us.
pub const USER_AGENT: &str = concat!(
    "feedping/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/dhofheinz/feedping)"
);

const MAX_CONCURRENT_FETCHES: usize = 10;
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors from fetching a single feed document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Build the shared HTTP client with the feedping user agent.
pub fn client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

/// Fetch every URL with up to [`MAX_CONCURRENT_FETCHES`] in flight.
///
/// Results come back in input order regardless of completion order, so
/// callers can zip them against the blogroll. Each element is the raw
/// document bytes or the per-feed error.
pub async fn fetch_all(
    client: &reqwest::Client,
    urls: &[String],
) -> Vec<Result<Vec<u8>, FetchError>> {
    let mut indexed: Vec<(usize, Result<Vec<u8>, FetchError>)> =
        stream::iter(urls.iter().cloned().enumerate())
            .map(|(i, url)| {
                let client = client.clone();
                async move { (i, fetch_one(&client, &url).await) }
            })
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, result)| result).collect()
}

/// Fetch one feed document with a timeout and a size-limited body read.
pub async fn fetch_one(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    tracing::debug!(url = %url, bytes = bytes.len(), "Fetched feed document");
    Ok(bytes)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
