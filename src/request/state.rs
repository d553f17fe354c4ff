//! Reactive state exposed by a request hook.

use super::RequestError;
use super::client::Response;
use crate::signal::Signal;

/// The reactive cells of one hook.
///
/// All fields are [`Signal`]s; clone the struct or a field to observe it from
/// another task.
#[derive(Debug, Clone)]
pub struct RequestState<T> {
    /// The last successful response.
    pub response: Signal<Option<Response>>,
    /// The last parsed payload, seeded from the default payload.
    pub data: Signal<Option<T>>,
    /// The last genuine failure. Cancellations never land here.
    pub error: Signal<Option<RequestError>>,
    /// True while at least one call is in flight.
    pub loading: Signal<bool>,
    /// True once the latest call has settled.
    pub finished: Signal<bool>,
    /// True when the latest call ended by cancellation.
    pub aborted: Signal<bool>,
}

impl<T> RequestState<T> {
    /// Creates idle state with `data` seeded to `initial`.
    #[must_use]
    pub fn new(initial: Option<T>) -> Self {
        Self {
            response: Signal::new(None),
            data: Signal::new(initial),
            error: Signal::new(None),
            loading: Signal::new(false),
            finished: Signal::new(false),
            aborted: Signal::new(false),
        }
    }

    /// Marks the start of a call.
    pub(crate) fn begin(&self) {
        self.loading.set(true);
        self.finished.set(false);
        self.aborted.set(false);
        self.error.set(None);
    }

    /// Stores a successful outcome.
    pub(crate) fn succeed(&self, response: Response, data: T) {
        self.response.set(Some(response));
        self.data.set(Some(data));
        self.error.set(None);
        self.aborted.set(false);
    }

    /// Stores a genuine failure.
    pub(crate) fn fail(&self, error: RequestError) {
        self.error.set(Some(error));
        self.aborted.set(false);
    }

    /// Marks the current call as aborted. `error` is left untouched.
    pub(crate) fn abort(&self) {
        self.aborted.set(true);
    }

    /// Marks the current call as settled.
    pub(crate) fn settle(&self, still_in_flight: bool) {
        self.finished.set(true);
        if !still_in_flight {
            self.loading.set(false);
        }
    }
}

impl<T: Clone> RequestState<T> {
    /// Returns true while a call is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// Returns a clone of the current payload.
    #[must_use]
    pub fn current_data(&self) -> Option<T> {
        self.data.get()
    }
}
