use crate::error::{ErrorKind, FetchError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One envelope of a paginated endpoint: a batch of raw records plus the
/// continuation cursor for the next request, if any.
#[derive(Debug, Deserialize)]
pub struct PageBatch {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A single failed request, classified for the retry policy.
#[derive(Debug)]
pub(crate) enum RequestError {
    Denied { status: u16 },
    RateLimited { retry_after: Option<Duration> },
    Server { status: u16 },
    Network(reqwest::Error),
    Malformed(String),
}

impl RequestError {
    pub(crate) fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Denied { .. } => ErrorKind::Denied,
            RequestError::RateLimited { .. } => ErrorKind::RateLimited,
            RequestError::Server { .. } => ErrorKind::Server,
            RequestError::Network(_) => ErrorKind::Network,
            RequestError::Malformed(_) => ErrorKind::Malformed,
        }
    }

    /// Server-provided backoff hint, when the response carried one.
    pub(crate) fn retry_after(&self) -> Option<Duration> {
        match self {
            RequestError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Denied { status } => write!(f, "access denied (status {})", status),
            RequestError::RateLimited { .. } => write!(f, "rate limited (status 429)"),
            RequestError::Server { status } => write!(f, "server error (status {})", status),
            RequestError::Network(err) => write!(f, "network error: {}", err),
            RequestError::Malformed(detail) => write!(f, "malformed response: {}", detail),
        }
    }
}

/// Thin transport over the workspace API: one HTTP request per method, no
/// pagination, no retries. The fetcher layers both on top.
pub struct WorkspaceClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl WorkspaceClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, token, 10)
    }

    pub fn with_timeout(base_url: &str, token: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let http = Client::builder()
            .user_agent("pagerot/0.3 (https://github.com/trailingedge/pagerot)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs / 2))
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            http,
            base_url,
            token: token.into(),
        })
    }

    /// Request one batch of records from a collection, optionally resuming
    /// at a continuation cursor.
    pub(crate) async fn query_page(
        &self,
        collection_id: &str,
        cursor: Option<&str>,
    ) -> std::result::Result<PageBatch, RequestError> {
        let url = self.endpoint(&format!("collections/{}/query", collection_id))?;
        let body = match cursor {
            Some(cursor) => json!({ "start_cursor": cursor }),
            None => json!({}),
        };

        debug!("POST {} (cursor: {:?})", url, cursor);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(RequestError::Network)?;

        Self::decode(response).await
    }

    /// Request one batch of visible collections from the search endpoint.
    pub(crate) async fn search_collections(
        &self,
        cursor: Option<&str>,
    ) -> std::result::Result<PageBatch, RequestError> {
        let url = self.endpoint("search")?;
        let mut body = json!({ "filter": { "property": "object", "value": "collection" } });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }

        debug!("POST {} (cursor: {:?})", url, cursor);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(RequestError::Network)?;

        Self::decode(response).await
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, RequestError> {
        self.base_url
            .join(path)
            .map_err(|e| RequestError::Malformed(format!("bad endpoint {}: {}", path, e)))
    }

    async fn decode(response: reqwest::Response) -> std::result::Result<PageBatch, RequestError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<PageBatch>()
                .await
                .map_err(|e| RequestError::Malformed(format!("undecodable body: {}", e)));
        }
        match status.as_u16() {
            // The source API reports resources invisible to the integration
            // as not-found; from our side that is the same authorization
            // failure as a plain 401/403.
            401 | 403 | 404 => Err(RequestError::Denied {
                status: status.as_u16(),
            }),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(RequestError::RateLimited { retry_after })
            }
            500..=599 => Err(RequestError::Server {
                status: status.as_u16(),
            }),
            s => Err(RequestError::Malformed(format!("unexpected status {}", s))),
        }
    }
}
