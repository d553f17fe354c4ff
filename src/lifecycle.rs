//! Component lifecycle scope.
//!
//! A [`Scope`] stands in for the lifetime of a UI component. Hooks register
//! teardown callbacks with [`Scope::on_unmount`]; they fire once, in
//! registration order, when the scope is unmounted or dropped.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

type UnmountHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct ScopeInner {
    unmounted: bool,
    hooks: Vec<UnmountHook>,
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        if !self.unmounted {
            self.unmounted = true;
            run_hooks(std::mem::take(&mut self.hooks));
        }
    }
}

fn run_hooks(hooks: Vec<UnmountHook>) {
    debug!(hooks = hooks.len(), "unmounting scope");
    for hook in hooks {
        hook();
    }
}

/// A component lifecycle that runs teardown hooks on unmount.
///
/// Cloning yields another handle to the same lifecycle. Dropping the last
/// handle unmounts implicitly. A hook that captures a `Scope` handle keeps the
/// scope alive, so such a scope must be unmounted explicitly.
#[derive(Clone, Default)]
pub struct Scope {
    inner: Arc<Mutex<ScopeInner>>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

impl Scope {
    /// Creates a mounted scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true until [`unmount`](Self::unmount) has run.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.lock().unmounted
    }

    /// Registers a hook to run on unmount.
    ///
    /// If the scope is already unmounted the hook runs immediately.
    pub fn on_unmount(&self, hook: impl FnOnce() + Send + 'static) {
        let mut inner = self.lock();
        if inner.unmounted {
            drop(inner);
            hook();
            return;
        }
        inner.hooks.push(Box::new(hook));
    }

    /// Runs all registered hooks once. Later calls are no-ops.
    pub fn unmount(&self) {
        let hooks = {
            let mut inner = self.lock();
            if inner.unmounted {
                return;
            }
            inner.unmounted = true;
            std::mem::take(&mut inner.hooks)
        };

        // Hooks run outside the lock so they may touch the scope themselves.
        run_hooks(hooks);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScopeInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
