//! Reactive HTTP requests bound to a component lifecycle.
//!
//! This module provides [`UseRequest`], which turns a URL template and a
//! request configuration into reactive state (`loading`, `data`, `error`,
//! `response`, `finished`, `aborted`) plus `execute` and `cancel` controls.
//!
//! # Features
//!
//! - `{param}` URL templates with percent-encoded values
//! - Bounded retry of failed attempts (immediate by default)
//! - Cooperative cancellation; a newer call can abort the previous one
//! - Cancellation on scope unmount
//! - Default payloads (value or producer) and success/error/finish callbacks
//!
//! # Example
//!
//! ```no_run
//! use fetcher_core::request::{HttpClient, RequestConfig, UseRequestOptions, use_request};
//! use fetcher_core::Scope;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scope = Scope::new();
//! let todo = use_request::<serde_json::Value>(
//!     HttpClient::new(),
//!     "https://jsonplaceholder.typicode.com/todos/{id}",
//!     RequestConfig::new().param("id", "1"),
//!     UseRequestOptions::new().on_success(|todo| println!("got {todo}")),
//!     &scope,
//! );
//! todo.execute().await?;
//! assert!(todo.finished().get());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod constants;
mod error;
mod hook;
mod options;
mod retry;
mod state;

pub use client::{HttpClient, PreparedRequest, Response};
pub use config::RequestConfig;
pub use constants::{CONNECT_TIMEOUT_SECS, DEFAULT_RETRY_COUNT};
pub use error::RequestError;
pub use hook::{UseRequest, use_request};
pub use options::{DefaultData, UseRequestOptions};
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
pub use state::RequestState;

// Note: no module-local Result alias. Use `Result<T, RequestError>` explicitly.
