//! Content fetching for challenge spec documents
//!
//! `ipfs://` URIs are rewritten onto an HTTP gateway, `http(s)://` URIs
//! are fetched as-is.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{IndexerError, IndexerResult};

/// Default public gateway
pub const DEFAULT_IPFS_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs/";

const IPFS_SCHEME: &str = "ipfs://";

/// Fetches a document by URI
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the document body as text
    async fn fetch_text(&self, uri: &str) -> IndexerResult<String>;
}

/// Reject URIs that are neither `ipfs://<cid>` nor `http(s)://`
pub fn check_content_uri(uri: &str) -> IndexerResult<()> {
    let uri = uri.trim();
    if let Some(cid) = uri.strip_prefix(IPFS_SCHEME) {
        if cid.trim_start_matches('/').is_empty() {
            return Err(IndexerError::spec_uri(uri, "empty content identifier"));
        }
        return Ok(());
    }
    if uri.starts_with("https://") || uri.starts_with("http://") {
        return Ok(());
    }
    Err(IndexerError::spec_uri(uri, "unsupported URI scheme"))
}

/// Map a content URI onto a fetchable URL
pub fn gateway_url(gateway: &str, uri: &str) -> IndexerResult<String> {
    check_content_uri(uri)?;
    let uri = uri.trim();
    match uri.strip_prefix(IPFS_SCHEME) {
        Some(cid) => {
            let gateway = gateway.trim_end_matches('/');
            Ok(format!("{gateway}/{}", cid.trim_start_matches('/')))
        }
        None => Ok(uri.to_string()),
    }
}

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum retries
    pub max_retries: u32,
    /// Initial backoff in milliseconds
    pub initial_backoff_ms: u64,
    /// Maximum backoff in milliseconds
    pub max_backoff_ms: u64,
    /// Backoff multiplier
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5000,
            multiplier: 2.0,
        }
    }
}

/// HTTP gateway fetcher
pub struct GatewayFetcher {
    gateway: String,
    client: reqwest::Client,
    retry_config: RetryConfig,
}

impl GatewayFetcher {
    /// Create a fetcher with a 30s timeout and default retries
    pub fn new(gateway: &str) -> Self {
        Self::with_config(gateway, 30, RetryConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(gateway: &str, timeout_secs: u64, retry_config: RetryConfig) -> Self {
        Self {
            gateway: gateway.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            retry_config,
        }
    }

    async fn fetch_once(&self, uri: &str, url: &str) -> IndexerResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IndexerError::fetch(uri, format!("request failed: {e}"), None))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexerError::fetch(
                uri,
                format!("gateway returned {status}"),
                Some(status.as_u16()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| IndexerError::fetch(uri, format!("failed to read body: {e}"), None))
    }

    /// Execute request with retry; non-retryable errors return at once
    async fn execute_with_retry<T, F, Fut>(&self, operation: F) -> IndexerResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = IndexerResult<T>>,
    {
        let mut backoff_ms = self.retry_config.initial_backoff_ms;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() || attempt >= self.retry_config.max_retries => {
                    return Err(e)
                }
                Err(e) => {
                    attempt += 1;
                    debug!(attempt, backoff_ms, error = %e, "fetch failed, retrying");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = std::cmp::min(
                        (backoff_ms as f64 * self.retry_config.multiplier) as u64,
                        self.retry_config.max_backoff_ms,
                    );
                }
            }
        }
    }
}

#[async_trait]
impl ContentFetcher for GatewayFetcher {
    async fn fetch_text(&self, uri: &str) -> IndexerResult<String> {
        let url = gateway_url(&self.gateway, uri)?;
        let result = self.execute_with_retry(|| self.fetch_once(uri, &url)).await;
        if let Err(e) = &result {
            warn!(uri, url = %url, error = %e, "spec fetch failed");
        }
        result
    }
}

/// Mock fetcher
///
/// Serves documents from memory and counts requests per URI.
pub struct MockContentFetcher {
    documents: RwLock<HashMap<String, String>>,
    requests: RwLock<HashMap<String, usize>>,
    /// Simulate gateway failure
    fail_mode: AtomicBool,
}

impl MockContentFetcher {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            requests: RwLock::new(HashMap::new()),
            fail_mode: AtomicBool::new(false),
        }
    }

    /// Enable failure mode for testing
    pub fn set_fail_mode(&self, fail: bool) {
        self.fail_mode.store(fail, Ordering::SeqCst);
    }

    pub fn insert(&self, uri: impl Into<String>, body: impl Into<String>) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri.into(), body.into());
    }

    /// Number of fetches seen for a URI
    pub fn request_count(&self, uri: &str) -> usize {
        self.requests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for MockContentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentFetcher for MockContentFetcher {
    async fn fetch_text(&self, uri: &str) -> IndexerResult<String> {
        *self
            .requests
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(uri.to_string())
            .or_insert(0) += 1;

        if self.fail_mode.load(Ordering::SeqCst) {
            return Err(IndexerError::fetch(uri, "gateway unavailable", Some(503)));
        }

        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
            .cloned()
            .ok_or_else(|| IndexerError::fetch(uri, "not found", Some(404)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_url() {
        assert_eq!(
            gateway_url(DEFAULT_IPFS_GATEWAY, "ipfs://QmSpec").unwrap(),
            "https://gateway.pinata.cloud/ipfs/QmSpec"
        );
        assert_eq!(
            gateway_url("http://localhost:8080/ipfs", "ipfs://QmSpec").unwrap(),
            "http://localhost:8080/ipfs/QmSpec"
        );
        assert_eq!(
            gateway_url(DEFAULT_IPFS_GATEWAY, "https://example.org/spec.yaml").unwrap(),
            "https://example.org/spec.yaml"
        );
    }

    #[test]
    fn test_gateway_url_rejects_unknown_scheme() {
        let err = gateway_url(DEFAULT_IPFS_GATEWAY, "ftp://example.org/spec").unwrap_err();
        assert!(matches!(err, IndexerError::SpecUri { .. }));
        assert!(!err.is_retryable());
        assert!(err.is_event_permanent());

        let err = gateway_url(DEFAULT_IPFS_GATEWAY, "ipfs://").unwrap_err();
        assert!(err.is_event_permanent());
        assert!(check_content_uri("ar://bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U").is_err());
        assert!(check_content_uri(" ipfs://QmSpec ").is_ok());
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let fetcher = GatewayFetcher::with_config(DEFAULT_IPFS_GATEWAY, 1, RetryConfig::default());
        let calls = std::sync::atomic::AtomicU32::new(0);

        let result: IndexerResult<()> = fetcher
            .execute_with_retry(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(IndexerError::fetch("ipfs://Qm", "not found", Some(404)))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_exhausts_transient_errors() {
        let retry = RetryConfig {
            max_retries: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            multiplier: 2.0,
        };
        let fetcher = GatewayFetcher::with_config(DEFAULT_IPFS_GATEWAY, 1, retry);
        let calls = std::sync::atomic::AtomicU32::new(0);

        let result: IndexerResult<()> = fetcher
            .execute_with_retry(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(IndexerError::fetch("ipfs://Qm", "timeout", None))
            })
            .await;

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_mock_fetcher() {
        let fetcher = MockContentFetcher::new();
        fetcher.insert("ipfs://QmSpec", "title: x");

        assert_eq!(fetcher.fetch_text("ipfs://QmSpec").await.unwrap(), "title: x");
        assert!(fetcher.fetch_text("ipfs://QmMissing").await.is_err());

        fetcher.set_fail_mode(true);
        assert!(fetcher.fetch_text("ipfs://QmSpec").await.unwrap_err().is_retryable());
        assert_eq!(fetcher.request_count("ipfs://QmSpec"), 2);
    }
}
