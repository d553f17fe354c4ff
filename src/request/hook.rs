//! The reactive request hook.
//!
//! [`UseRequest`] binds a URL template, a [`RequestConfig`] and
//! [`UseRequestOptions`] to a [`Scope`], exposing [`RequestState`] signals and
//! the `execute` / `cancel` controls.
//!
//! # Call lifecycle
//!
//! Every `execute` is one *call* with its own cancellation handle and a
//! monotonically increasing generation. Starting a call overwrites the hook's
//! current handle; with auto-cancel-previous the old handle is cancelled first.
//! Once a newer call has started, an older call settles silently if it was
//! aborted (or always, under auto-cancel-previous) so the newer call owns the
//! state.
//!
//! `loading` tracks an in-flight counter, so with auto-cancel disabled it stays
//! true until the last racing call settles.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::client::{HttpClient, PreparedRequest, Response};
use super::config::RequestConfig;
use super::constants::{MANUAL_CANCEL_REASON, SUPERSEDED_REASON, UNMOUNTED_REASON};
use super::options::UseRequestOptions;
use super::retry::{RetryDecision, RetryPolicy};
use super::state::RequestState;
use super::RequestError;
use crate::lifecycle::Scope;
use crate::signal::Signal;

/// Cancellation handle for one call.
#[derive(Debug, Clone)]
struct CallHandle {
    generation: u64,
    token: CancellationToken,
    reason: Arc<Mutex<Option<String>>>,
}

impl CallHandle {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            token: CancellationToken::new(),
            reason: Arc::new(Mutex::new(None)),
        }
    }

    /// Cancels the call. The first reason recorded wins.
    fn cancel(&self, reason: &str) {
        {
            let mut slot = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(reason.to_string());
            }
        }
        self.token.cancel();
    }

    fn reason(&self) -> String {
        self.reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| MANUAL_CANCEL_REASON.to_string())
    }
}

struct Inner<T> {
    client: HttpClient,
    url: String,
    config: RequestConfig,
    options: UseRequestOptions<T>,
    policy: RetryPolicy,
    state: RequestState<T>,
    current: Mutex<Option<CallHandle>>,
    generation: AtomicU64,
    in_flight: AtomicUsize,
}

/// A reactive HTTP request bound to a component scope.
///
/// Cloning yields another handle to the same hook and state.
///
/// ```no_run
/// use fetcher_core::request::{HttpClient, RequestConfig, UseRequest, UseRequestOptions};
/// use fetcher_core::Scope;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let scope = Scope::new();
/// let users = UseRequest::<Vec<serde_json::Value>>::new(
///     HttpClient::new(),
///     "https://api.example.com/orgs/{org}/users",
///     RequestConfig::new().param("org", "rust-lang"),
///     UseRequestOptions::new().retry(2),
///     &scope,
/// );
///
/// let mut loading = users.state().loading.subscribe();
/// let data = users.execute().await?;
/// println!("{} users, loading now {}", data.len(), *loading.borrow_and_update());
/// # Ok(())
/// # }
/// ```
pub struct UseRequest<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for UseRequest<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for UseRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UseRequest")
            .field("url", &self.inner.url)
            .field("in_flight", &self.inner.in_flight.load(Ordering::SeqCst))
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

/// Creates a request hook. Shorthand for [`UseRequest::new`].
pub fn use_request<T>(
    client: HttpClient,
    url: impl Into<String>,
    config: RequestConfig,
    options: UseRequestOptions<T>,
    scope: &Scope,
) -> UseRequest<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    UseRequest::new(client, url, config, options, scope)
}

impl<T> UseRequest<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates a hook for `url` (a template with optional `{param}` placeholders).
    ///
    /// With `auto_cancel_on_unmount`, the in-flight call is aborted when
    /// `scope` unmounts. With `immediate`, one call is spawned on the current
    /// Tokio runtime; outside a runtime that call is skipped with a warning.
    #[instrument(level = "debug", skip_all, fields(url = tracing::field::Empty))]
    pub fn new(
        client: HttpClient,
        url: impl Into<String>,
        config: RequestConfig,
        options: UseRequestOptions<T>,
        scope: &Scope,
    ) -> Self {
        let url = url.into();
        tracing::Span::current().record("url", url.as_str());

        let state = RequestState::new(options.default_data.produce());
        let policy = options.retry_policy();
        let auto_cancel_on_unmount = options.auto_cancel_on_unmount;
        let immediate = options.immediate;

        let hook = Self {
            inner: Arc::new(Inner {
                client,
                url,
                config,
                options,
                policy,
                state,
                current: Mutex::new(None),
                generation: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
            }),
        };

        if auto_cancel_on_unmount {
            let weak: Weak<Inner<T>> = Arc::downgrade(&hook.inner);
            scope.on_unmount(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.cancel_current(UNMOUNTED_REASON);
                }
            });
        }

        if immediate {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    // Start synchronously so `loading` is already true on return.
                    let guard = CallGuard::start(&hook.inner);
                    runtime.spawn(async move {
                        // Outcome is observable through the state signals.
                        let _ = guard.run(RequestConfig::default()).await;
                    });
                }
                Err(_) => warn!("immediate execution needs a Tokio runtime; skipped"),
            }
        }

        hook
    }

    /// Executes the request with the hook's configuration.
    ///
    /// # Errors
    ///
    /// Returns the final [`RequestError`] after retries, or
    /// [`RequestError::Cancelled`] if the call was aborted.
    pub async fn execute(&self) -> Result<T, RequestError> {
        self.execute_with(RequestConfig::default()).await
    }

    /// Executes the request with per-call `overrides` merged over the hook's
    /// configuration (see [`RequestConfig::merge`]).
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    #[instrument(skip(self, overrides), fields(url = %self.inner.url))]
    pub async fn execute_with(&self, overrides: RequestConfig) -> Result<T, RequestError> {
        CallGuard::start(&self.inner).run(overrides).await
    }

    /// Aborts the in-flight call, if any.
    pub fn cancel(&self) {
        self.cancel_with(MANUAL_CANCEL_REASON);
    }

    /// Aborts the in-flight call with a custom reason.
    pub fn cancel_with(&self, reason: &str) {
        self.inner.cancel_current(reason);
    }
}

impl<T> UseRequest<T> {
    /// Returns all reactive cells.
    #[must_use]
    pub fn state(&self) -> &RequestState<T> {
        &self.inner.state
    }

    /// Returns the URL template.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Returns the `loading` signal.
    #[must_use]
    pub fn loading(&self) -> &Signal<bool> {
        &self.inner.state.loading
    }

    /// Returns the `finished` signal.
    #[must_use]
    pub fn finished(&self) -> &Signal<bool> {
        &self.inner.state.finished
    }

    /// Returns the `aborted` signal.
    #[must_use]
    pub fn aborted(&self) -> &Signal<bool> {
        &self.inner.state.aborted
    }

    /// Returns the `data` signal.
    #[must_use]
    pub fn data(&self) -> &Signal<Option<T>> {
        &self.inner.state.data
    }

    /// Returns the `error` signal.
    #[must_use]
    pub fn error(&self) -> &Signal<Option<RequestError>> {
        &self.inner.state.error
    }

    /// Returns the `response` signal.
    #[must_use]
    pub fn response(&self) -> &Signal<Option<Response>> {
        &self.inner.state.response
    }

    /// Returns true while any call of this hook is running.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }
}

impl<T> Inner<T> {
    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<CallHandle>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_current(&self, reason: &str) {
        let current = self.lock_current().clone();
        match current {
            Some(call) => {
                debug!(generation = call.generation, reason, "cancelling in-flight request");
                call.cancel(reason);
            }
            None => debug!(reason, "cancel requested with nothing in flight"),
        }
    }

    /// Removes `call` as the current handle if nothing newer replaced it.
    fn release(&self, call: &CallHandle) {
        let mut current = self.lock_current();
        if current
            .as_ref()
            .is_some_and(|c| c.generation == call.generation)
        {
            *current = None;
        }
    }
}

impl<T> Inner<T>
where
    T: DeserializeOwned + Clone,
{
    fn start_call(&self) -> CallHandle {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let call = CallHandle::new(generation);

        let previous = self.lock_current().replace(call.clone());
        if self.options.auto_cancel_previous {
            if let Some(previous) = previous {
                debug!(
                    previous = previous.generation,
                    generation, "aborting previous request"
                );
                previous.cancel(SUPERSEDED_REASON);
            }
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.options.reset_on_execute {
            self.state.data.set(self.options.default_data.produce());
        }
        self.state.begin();
        call
    }

    async fn run(
        &self,
        call: &CallHandle,
        overrides: &RequestConfig,
    ) -> Result<(Response, T), RequestError> {
        let config = self.config.merge(overrides);
        let request = PreparedRequest::from_template(&self.url, &config)?;
        let mut attempt = 1;

        loop {
            let error = match self.client.send(&request, &call.token).await {
                Ok(response) => match response.json::<T>() {
                    Ok(data) => return Ok((response, data)),
                    Err(e) => e,
                },
                Err(e) if e.is_cancelled() => {
                    return Err(RequestError::cancelled(request.url.as_str(), call.reason()));
                }
                Err(e) => e,
            };

            match self.policy.should_retry(&error, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    debug!(attempt, error = %error, "request failed, retrying");
                    if !delay.is_zero() {
                        tokio::select! {
                            biased;
                            () = call.token.cancelled() => {
                                return Err(RequestError::cancelled(
                                    request.url.as_str(),
                                    call.reason(),
                                ));
                            }
                            () = tokio::time::sleep(delay) => {}
                        }
                    }
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(attempt, %reason, "not retrying");
                    return Err(error);
                }
            }
        }
    }

    fn finish_call(
        &self,
        call: &CallHandle,
        outcome: Result<(Response, T), RequestError>,
    ) -> Result<T, RequestError> {
        self.release(call);
        let remaining = self.in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);

        // A call replaced by a newer one leaves the state to it when it was
        // aborted, or always under auto-cancel-previous.
        let latest = call.generation == self.generation.load(Ordering::SeqCst);
        let cancelled = matches!(&outcome, Err(error) if error.is_cancelled());
        if !latest && (self.options.auto_cancel_previous || cancelled) {
            debug!(generation = call.generation, "stale request settled");
            if remaining == 0 {
                self.state.loading.set(false);
            }
            return outcome.map(|(_, data)| data);
        }

        match &outcome {
            Ok((response, data)) => {
                info!(status = response.status, url = %response.url, "request succeeded");
                self.state.succeed(response.clone(), data.clone());
                if let Some(on_success) = &self.options.on_success {
                    on_success(data);
                }
            }
            Err(error) if error.is_cancelled() => {
                debug!(generation = call.generation, "request aborted");
                self.state.abort();
            }
            Err(error) => {
                warn!(error = %error, "request failed");
                self.state.fail(error.clone());
                if let Some(on_error) = &self.options.on_error {
                    on_error(error);
                }
            }
        }

        if let Some(on_finish) = &self.options.on_finish {
            on_finish();
        }
        self.state.settle(remaining > 0);

        outcome.map(|(_, data)| data)
    }
}

/// Owns one call from start to settle.
///
/// Dropping it before the call settles, e.g. a dropped `execute` future or a
/// spawned task discarded at runtime shutdown, settles the call as aborted.
struct CallGuard<T>
where
    T: DeserializeOwned + Clone,
{
    inner: Arc<Inner<T>>,
    call: CallHandle,
    done: bool,
}

impl<T> CallGuard<T>
where
    T: DeserializeOwned + Clone,
{
    fn start(inner: &Arc<Inner<T>>) -> Self {
        let call = inner.start_call();
        Self {
            inner: Arc::clone(inner),
            call,
            done: false,
        }
    }

    async fn run(mut self, overrides: RequestConfig) -> Result<T, RequestError> {
        let outcome = self.inner.run(&self.call, &overrides).await;
        self.done = true;
        self.inner.finish_call(&self.call, outcome)
    }
}

impl<T> Drop for CallGuard<T>
where
    T: DeserializeOwned + Clone,
{
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.call.cancel("execution dropped");
        let aborted = Err(RequestError::cancelled(self.inner.url.clone(), self.call.reason()));
        let _ = self.inner.finish_call(&self.call, aborted);
    }
}
