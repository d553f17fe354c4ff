//! Per-hook request configuration and per-call overrides.

use std::collections::HashMap;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use url::Url;

use super::RequestError;

/// HTTP request settings shared by every call of a hook.
///
/// Calls may pass another `RequestConfig` as overrides; see [`merge`](Self::merge).
///
/// ```
/// use fetcher_core::request::RequestConfig;
///
/// let config = RequestConfig::new()
///     .base_url("https://api.example.com")
///     .param("id", "42")
///     .query("expand", "posts");
/// assert_eq!(config.method().as_str(), "GET");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// HTTP method; `None` means GET.
    pub method: Option<Method>,
    /// Prefix for relative URL templates.
    pub base_url: Option<String>,
    /// Extra request headers.
    pub headers: HeaderMap,
    /// Query string pairs, in order.
    pub query: Vec<(String, String)>,
    /// JSON request body.
    pub body: Option<serde_json::Value>,
    /// Values for `{param}` placeholders in the URL template.
    pub params: HashMap<String, String>,
}

impl RequestConfig {
    /// Creates an empty configuration (GET, no headers, no body).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a typed header, replacing any existing value for the name.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds a header from strings.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidHeader`] if the name or value is not valid HTTP.
    pub fn try_header(self, name: &str, value: &str) -> Result<Self, RequestError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| RequestError::invalid_header(name))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| RequestError::invalid_header(name))?;
        Ok(self.header(header_name, header_value))
    }

    /// Appends a query pair.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets the JSON body from a raw value.
    #[must_use]
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the JSON body by serializing `body`.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `body` cannot be represented as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Sets one URL template parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Returns the effective HTTP method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    /// Combines this configuration with per-call `overrides`.
    ///
    /// Method, base URL and body are replaced when the override sets them.
    /// Headers, query pairs and params are combined; on a key clash the
    /// override wins.
    #[must_use]
    pub fn merge(&self, overrides: &RequestConfig) -> RequestConfig {
        let mut merged = self.clone();

        if overrides.method.is_some() {
            merged.method.clone_from(&overrides.method);
        }
        if overrides.base_url.is_some() {
            merged.base_url.clone_from(&overrides.base_url);
        }
        if overrides.body.is_some() {
            merged.body.clone_from(&overrides.body);
        }

        for (name, value) in &overrides.headers {
            merged.headers.insert(name.clone(), value.clone());
        }

        merged
            .query
            .retain(|(key, _)| !overrides.query.iter().any(|(k, _)| k == key));
        merged.query.extend(overrides.query.iter().cloned());

        merged
            .params
            .extend(overrides.params.iter().map(|(k, v)| (k.clone(), v.clone())));

        merged
    }

    /// Resolves an expanded URL against the base URL.
    ///
    /// Absolute URLs are used as-is. Relative ones are appended to the base
    /// with exactly one `/` between them.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidUrl`] if the result is not an absolute
    /// `http`/`https` URL.
    pub fn resolve_url(&self, expanded: &str) -> Result<Url, RequestError> {
        if let Ok(url) = Url::parse(expanded) {
            return check_scheme(url, expanded);
        }

        let Some(base) = self.base_url.as_deref() else {
            return Err(RequestError::invalid_url(expanded));
        };

        let joined = if expanded.is_empty() {
            base.to_string()
        } else {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                expanded.trim_start_matches('/')
            )
        };

        let url = Url::parse(&joined).map_err(|_| RequestError::invalid_url(joined.clone()))?;
        check_scheme(url, &joined)
    }
}

fn check_scheme(url: Url, raw: &str) -> Result<Url, RequestError> {
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(RequestError::invalid_url(raw)),
    }
}
