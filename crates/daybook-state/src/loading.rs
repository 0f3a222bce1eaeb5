//! Shared busy-flag middleware.

use crate::{StateStore, Subscription};
use std::future::Future;

/// Loading state broadcast to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingState {
    pub is_loading: bool,
    /// Optional human-readable description of the busy operation.
    pub message: Option<String>,
}

/// Exposes a single shared "is something happening" flag.
///
/// One logical busy span is representable at a time; overlapping
/// operations stomp the shared flag.
#[derive(Clone)]
pub struct LoadingMiddleware {
    store: StateStore<LoadingState>,
}

impl LoadingMiddleware {
    pub fn new() -> Self {
        Self {
            store: StateStore::new(LoadingState::default()),
        }
    }

    /// Subscribe to loading state changes; the listener is invoked
    /// immediately with the current state.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&LoadingState) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Current loading state snapshot.
    pub fn state(&self) -> LoadingState {
        self.store.get()
    }

    /// Raise the busy flag.
    pub fn show_loading(&self, message: Option<&str>) {
        self.store.replace(LoadingState {
            is_loading: true,
            message: message.map(str::to_string),
        });
    }

    /// Clear the busy flag.
    pub fn hide_loading(&self) {
        self.store.replace(LoadingState::default());
    }

    /// Run `operation` with the busy flag raised.
    ///
    /// The flag is cleared when the operation settles, whether it
    /// succeeded, failed, or the wrapped future was dropped mid-flight.
    /// The operation's output is propagated unchanged.
    pub async fn with_loading<F>(&self, message: Option<&str>, operation: F) -> F::Output
    where
        F: Future,
    {
        self.show_loading(message);
        let _guard = HideOnSettle {
            middleware: self.clone(),
        };
        operation.await
    }
}

impl Default for LoadingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the busy flag when the wrapped operation settles.
struct HideOnSettle {
    middleware: LoadingMiddleware,
}

impl Drop for HideOnSettle {
    fn drop(&mut self) {
        self.middleware.hide_loading();
    }
}
