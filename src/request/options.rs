//! Behaviour options for a request hook.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::RequestError;
use super::constants::{DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY};
use super::retry::RetryPolicy;

type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&RequestError) + Send + Sync>;
type FinishCallback = Arc<dyn Fn() + Send + Sync>;

/// Initial payload for a hook's `data` cell.
pub enum DefaultData<T> {
    /// Start with no data.
    None,
    /// Start with a clone of this value.
    Value(T),
    /// Start with whatever the producer returns; called again on every reset.
    Producer(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T> Default for DefaultData<T> {
    fn default() -> Self {
        Self::None
    }
}

impl<T: Clone> Clone for DefaultData<T> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Value(value) => Self::Value(value.clone()),
            Self::Producer(producer) => Self::Producer(Arc::clone(producer)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DefaultData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl<T: Clone> DefaultData<T> {
    /// Produces the initial payload.
    #[must_use]
    pub fn produce(&self) -> Option<T> {
        match self {
            Self::None => None,
            Self::Value(value) => Some(value.clone()),
            Self::Producer(producer) => Some(producer()),
        }
    }
}

/// Options controlling cancellation, retries, initial data and callbacks.
///
/// ```
/// use fetcher_core::request::UseRequestOptions;
///
/// let options = UseRequestOptions::<Vec<String>>::new()
///     .immediate(true)
///     .retry(2)
///     .default_value(Vec::new())
///     .on_error(|e| eprintln!("request failed: {e}"));
/// assert_eq!(options.retry_count(), 2);
/// ```
pub struct UseRequestOptions<T> {
    pub(crate) auto_cancel_previous: bool,
    pub(crate) auto_cancel_on_unmount: bool,
    pub(crate) immediate: bool,
    pub(crate) reset_on_execute: bool,
    pub(crate) default_data: DefaultData<T>,
    pub(crate) retry: u32,
    pub(crate) retry_delay: Duration,
    pub(crate) on_success: Option<SuccessCallback<T>>,
    pub(crate) on_error: Option<ErrorCallback>,
    pub(crate) on_finish: Option<FinishCallback>,
}

impl<T> Default for UseRequestOptions<T> {
    fn default() -> Self {
        Self {
            auto_cancel_previous: true,
            auto_cancel_on_unmount: true,
            immediate: false,
            reset_on_execute: false,
            default_data: DefaultData::None,
            retry: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            on_success: None,
            on_error: None,
            on_finish: None,
        }
    }
}

impl<T> fmt::Debug for UseRequestOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UseRequestOptions")
            .field("auto_cancel_previous", &self.auto_cancel_previous)
            .field("auto_cancel_on_unmount", &self.auto_cancel_on_unmount)
            .field("immediate", &self.immediate)
            .field("reset_on_execute", &self.reset_on_execute)
            .field("retry", &self.retry)
            .field("retry_delay", &self.retry_delay)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish_non_exhaustive()
    }
}

impl<T> UseRequestOptions<T> {
    /// Creates the default options.
    ///
    /// Defaults: auto-cancel previous and on unmount, not immediate,
    /// no default data, no retries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the in-flight call when a new one starts.
    #[must_use]
    pub fn auto_cancel_previous(mut self, enabled: bool) -> Self {
        self.auto_cancel_previous = enabled;
        self
    }

    /// Abort the in-flight call when the owning scope unmounts.
    #[must_use]
    pub fn auto_cancel_on_unmount(mut self, enabled: bool) -> Self {
        self.auto_cancel_on_unmount = enabled;
        self
    }

    /// Execute once as soon as the hook is created.
    #[must_use]
    pub fn immediate(mut self, enabled: bool) -> Self {
        self.immediate = enabled;
        self
    }

    /// Reset `data` to the default payload whenever a call starts.
    #[must_use]
    pub fn reset_on_execute(mut self, enabled: bool) -> Self {
        self.reset_on_execute = enabled;
        self
    }

    /// Seeds `data` with a fixed value.
    #[must_use]
    pub fn default_value(mut self, value: T) -> Self {
        self.default_data = DefaultData::Value(value);
        self
    }

    /// Seeds `data` with the result of `producer`.
    #[must_use]
    pub fn default_with(mut self, producer: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.default_data = DefaultData::Producer(Arc::new(producer));
        self
    }

    /// Number of extra attempts after a failed one.
    #[must_use]
    pub fn retry(mut self, count: u32) -> Self {
        self.retry = count;
        self
    }

    /// Pause between attempts; zero re-invokes immediately.
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Called with the parsed payload after a successful call.
    #[must_use]
    pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// Called once with the final error of a failed call. Not called on cancellation.
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&RequestError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Called after every call settles, whatever the outcome.
    #[must_use]
    pub fn on_finish(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_finish = Some(Arc::new(callback));
        self
    }

    /// Returns the configured retry count.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry
    }

    /// Builds the retry policy these options describe.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry).with_delay(self.retry_delay)
    }
}
