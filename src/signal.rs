//! Reactive state cells.
//!
//! A [`Signal`] holds one value and notifies subscribers whenever it changes.
//! It is backed by a [`tokio::sync::watch`] channel: readers always see the
//! latest value, and intermediate values may be skipped by slow subscribers.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable reactive cell.
///
/// Clones share the same underlying value; a `set` through any clone is seen
/// by every subscriber.
///
/// ```
/// use fetcher_core::Signal;
///
/// let loading = Signal::new(false);
/// let mut rx = loading.subscribe();
/// loading.set(true);
/// assert!(rx.has_changed().unwrap());
/// assert!(*rx.borrow_and_update());
/// ```
pub struct Signal<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&*self.tx.borrow()).finish()
    }
}

impl<T: Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Signal<T> {
    /// Creates a signal holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(value)),
        }
    }

    /// Replaces the value and notifies subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Modifies the value in place and notifies subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Borrows the current value without cloning.
    ///
    /// Holding the returned guard blocks writers; keep it short-lived.
    pub fn read(&self) -> watch::Ref<'_, T> {
        self.tx.borrow()
    }

    /// Returns a receiver that observes every subsequent change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Signal<T> {
    /// Returns a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Waits for the next change and returns the new value.
    pub async fn changed(&self) -> T {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so `changed` only fails once we are gone.
        let _ = rx.changed().await;
        rx.borrow_and_update().clone()
    }

    /// Waits until the value satisfies `predicate`, returning that value.
    ///
    /// Resolves immediately if the current value already matches.
    pub async fn wait_for(&self, predicate: impl FnMut(&T) -> bool) -> T {
        let mut rx = self.subscribe();
        match rx.wait_for(predicate).await {
            Ok(value) => value.clone(),
            // The sender lives in `self`, so the channel cannot close while we wait.
            Err(_) => self.get(),
        }
    }
}
