//! Normalized failure broadcast.

use crate::{StateStore, Subscription};
use daybook_types::AppError;
use std::future::Future;

/// Error state broadcast to subscribers.
///
/// Each new error overwrites the previous one; only the most recent
/// failure is observable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
    pub has_error: bool,
    pub message: Option<String>,
    /// Stable machine-readable code, when known.
    pub code: Option<String>,
}

/// Captures failures into a shared error broadcast.
#[derive(Clone)]
pub struct ErrorMiddleware {
    store: StateStore<ErrorState>,
}

impl ErrorMiddleware {
    pub fn new() -> Self {
        Self {
            store: StateStore::new(ErrorState::default()),
        }
    }

    /// Subscribe to error state changes; the listener is invoked
    /// immediately with the current state.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ErrorState) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Current error state snapshot.
    pub fn state(&self) -> ErrorState {
        self.store.get()
    }

    /// Broadcast an error, replacing any previous one.
    pub fn set_error(&self, message: impl Into<String>, code: Option<&str>) {
        self.store.replace(ErrorState {
            has_error: true,
            message: Some(message.into()),
            code: code.map(str::to_string),
        });
    }

    /// Clear the broadcast error.
    pub fn clear_error(&self) {
        self.store.replace(ErrorState::default());
    }

    /// Normalize an application error and broadcast it.
    ///
    /// The message is prefixed with `context` when given; the stable
    /// code comes from the error taxonomy.
    pub fn handle_error(&self, error: &AppError, context: Option<&str>) {
        let message = match context {
            Some(context) => format!("{}: {}", context, error),
            None => error.to_string(),
        };
        let code = error.code().to_string();

        tracing::error!(code = %code, context = ?context, "handled error: {}", error);
        self.set_error(message, Some(&code));
    }

    /// Clear the error state, run `operation`, and swallow its failure.
    ///
    /// On failure the error is broadcast via [`handle_error`] and
    /// `None` is returned: callers treat `None` as "a handled failure
    /// occurred; inspect this middleware's state for detail".
    ///
    /// [`handle_error`]: ErrorMiddleware::handle_error
    pub async fn with_error_handling<T, F>(&self, context: Option<&str>, operation: F) -> Option<T>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        self.clear_error();
        match operation.await {
            Ok(value) => Some(value),
            Err(error) => {
                self.handle_error(&error, context);
                None
            }
        }
    }
}

impl Default for ErrorMiddleware {
    fn default() -> Self {
        Self::new()
    }
}
