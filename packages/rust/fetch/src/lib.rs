//! HTTP fetching for the enrichment pipeline.
//!
//! [`Fetcher`] retrieves one document per call with a bounded timeout and
//! never lets a failure escape as anything but a [`FetchError`] value.
//! [`AssetDownloader`] streams images to disk over the same client.

mod assets;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use enricher_shared::{EnricherError, Result};

pub use assets::AssetDownloader;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// User-Agent string for every outbound request.
const USER_AGENT: &str = concat!("vault-enricher/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A successfully retrieved document.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// The URL that was requested (used as the base for relative references).
    pub url: Url,
    /// HTTP status code (always 2xx).
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

/// Terminal failure of a single fetch. Recorded, never raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: String,
}

impl FetchError {
    fn new(url: &Url, cause: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            cause: cause.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Single-request document fetcher. No retries.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Build a fetcher whose requests time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        if timeout_secs == 0 {
            return Err(EnricherError::config("fetch timeout must be greater than zero"));
        }

        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| EnricherError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A downloader sharing this fetcher's client and timeout.
    pub fn asset_downloader(&self) -> AssetDownloader {
        AssetDownloader::new(self.client.clone())
    }

    /// GET `url` and return its body, or a [`FetchError`] on any failure.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> std::result::Result<RawDocument, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FetchError::new(url, describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(url, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::new(url, format!("body read failed: {}", describe(&e))))?;

        debug!(status = status.as_u16(), len = body.len(), "fetched document");

        Ok(RawDocument {
            url: url.clone(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Short cause string for a reqwest error.
fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn zero_timeout_is_a_config_error() {
        let err = Fetcher::new(0).unwrap_err();
        assert!(matches!(err, EnricherError::Config { .. }));
    }

    #[test]
    fn fetch_error_display_includes_url() {
        let url = Url::parse("https://example.com/page").unwrap();
        let err = FetchError::new(&url, "HTTP 404 Not Found");
        assert_eq!(err.to_string(), "https://example.com/page: HTTP 404 Not Found");
    }

    #[tokio::test]
    async fn fetch_returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/space"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><title>Hi</title></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(DEFAULT_TIMEOUT_SECS).unwrap();
        let url = Url::parse(&format!("{}/space", server.uri())).unwrap();
        let doc = fetcher.fetch(&url).await.expect("fetch ok");

        assert_eq!(doc.status, 200);
        assert_eq!(doc.url, url);
        assert!(doc.body.contains("<title>Hi</title>"));
    }

    #[tokio::test]
    async fn non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(DEFAULT_TIMEOUT_SECS).unwrap();
        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert_eq!(err.url, url.to_string());
        assert!(err.cause.contains("404"));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(1).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(err.cause.contains("timed out"), "cause: {}", err.cause);
    }
}
