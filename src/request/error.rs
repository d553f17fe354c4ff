//! Error types for the request module.
//!
//! Every failure a hook can observe is a [`RequestError`]. The type is `Clone`
//! so the same value can sit in the reactive `error` cell and be returned from
//! [`execute`](crate::request::UseRequest::execute); non-cloneable sources are
//! wrapped in [`Arc`].

use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur while executing a request.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// The URL (after template expansion) is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// A `{param}` placeholder in the URL template has no value.
    #[error("missing value for URL parameter `{name}` in {template}")]
    MissingParam {
        /// Placeholder name without braces.
        name: String,
        /// The template that referenced it.
        template: String,
    },

    /// A header name or value in the request configuration is not valid HTTP.
    #[error("invalid header `{name}`")]
    InvalidHeader {
        /// The offending header name as given.
        name: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: Arc<reqwest::Error>,
    },

    /// The client connect timeout elapsed.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP status (4xx client errors, 5xx server errors).
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present.
        retry_after: Option<String>,
    },

    /// The response body could not be parsed into the payload type.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// The URL whose body failed to parse.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// The call was aborted through its cancellation handle.
    #[error("request to {url} cancelled: {reason}")]
    Cancelled {
        /// The URL of the aborted call.
        url: String,
        /// Why the call was aborted.
        reason: String,
    },
}

impl RequestError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a missing-parameter error.
    pub fn missing_param(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self::MissingParam {
            name: name.into(),
            template: template.into(),
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error is a cancellation rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns the HTTP status code for status errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// No `From<reqwest::Error>`: every variant needs the URL, which the source
// error does not reliably carry. Use the constructors above.
