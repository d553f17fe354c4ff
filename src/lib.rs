//! Fetcher Core Library
//!
//! A reactive HTTP-request helper: given a URL template and request
//! configuration, [`UseRequest`] exposes reactive state (loading, data, error)
//! and imperative controls (execute, cancel) bound to a component [`Scope`].
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`request`] - The request hook, HTTP client wrapper, retry and errors
//! - [`signal`] - Reactive state cells over `tokio::sync::watch`
//! - [`lifecycle`] - Component scope with unmount hooks
//! - [`template`] - `{param}` URL template expansion

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod lifecycle;
pub mod request;
pub mod signal;
pub mod template;
mod user_agent;

// Re-export commonly used types
pub use lifecycle::Scope;
pub use request::{
    DEFAULT_RETRY_COUNT, HttpClient, RequestConfig, RequestError, RequestState, RetryPolicy,
    UseRequest, UseRequestOptions, use_request,
};
pub use signal::Signal;
