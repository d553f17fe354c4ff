//! HTTP client wrapper used by request hooks.
//!
//! [`HttpClient`] turns a [`PreparedRequest`] into a [`Response`], racing the
//! whole exchange (send and body read) against a cancellation token.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use super::RequestError;
use super::config::RequestConfig;
use super::constants::CONNECT_TIMEOUT_SECS;
use crate::template;
use crate::user_agent;

/// A completed HTTP exchange with a success status.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Final URL after redirects.
    pub url: String,
    /// Raw body text.
    pub body: String,
}

impl Response {
    /// Parses the body as JSON into `T`.
    ///
    /// An empty body parses as JSON `null`, so `Option<_>` and `()` payloads
    /// accept `204 No Content`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Decode`] if the body does not match `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, RequestError> {
        let text = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(text).map_err(|e| RequestError::decode(self.url.clone(), e))
    }
}

/// A fully resolved request: template expanded, query applied.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
}

impl PreparedRequest {
    /// Expands `template` with the config's params and resolves it into a request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingParam`] or [`RequestError::InvalidUrl`].
    pub fn from_template(template: &str, config: &RequestConfig) -> Result<Self, RequestError> {
        let expanded = template::expand(template, &config.params)?;
        let mut url = config.resolve_url(&expanded)?;
        if !config.query.is_empty() {
            url.query_pairs_mut().extend_pairs(config.query.iter());
        }

        Ok(Self {
            method: config.method(),
            url,
            headers: config.headers.clone(),
            body: config.body.clone(),
        })
    }
}

/// HTTP client for request hooks.
///
/// Create once and share between hooks to reuse the connection pool.
///
/// ```no_run
/// use fetcher_core::request::{HttpClient, PreparedRequest, RequestConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let request = PreparedRequest::from_template(
///     "https://api.example.com/users/{id}",
///     &RequestConfig::new().param("id", "1"),
/// )?;
/// let response = client.send(&request, &CancellationToken::new()).await?;
/// println!("HTTP {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with the default connect timeout (30 seconds).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static configuration.
    /// This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
    }

    /// Creates a client with an explicit connect timeout.
    ///
    /// There is no overall request timeout; long calls end only by
    /// completing or by cancellation.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the supplied configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Wraps an already configured reqwest client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Sends `request`, returning early with [`RequestError::Cancelled`] if
    /// `cancel` fires before the body has been read.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Timeout`] when the connect timeout elapses
    /// - [`RequestError::Network`] for other transport failures
    /// - [`RequestError::HttpStatus`] for non-2xx responses
    /// - [`RequestError::Cancelled`] when the token fires first
    #[instrument(skip(self, request, cancel), fields(method = %request.method, url = %request.url))]
    pub async fn send(
        &self,
        request: &PreparedRequest,
        cancel: &CancellationToken,
    ) -> Result<Response, RequestError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("request aborted");
                Err(RequestError::cancelled(request.url.as_str(), "aborted"))
            }
            result = self.send_inner(request) => result,
        }
    }

    async fn send_inner(&self, request: &PreparedRequest) -> Result<Response, RequestError> {
        let url = request.url.as_str();

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RequestError::timeout(url)
            } else {
                RequestError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(std::string::ToString::to_string);
            debug!(status = status.as_u16(), "request failed with status");
            return Err(RequestError::http_status_with_retry_after(
                url,
                status.as_u16(),
                retry_after,
            ));
        }

        let headers = response.headers().clone();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| RequestError::network(url, e))?;

        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(Response {
            status: status.as_u16(),
            headers,
            url: final_url,
            body,
        })
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}
