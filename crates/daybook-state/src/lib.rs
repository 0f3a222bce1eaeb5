//! Observable state containers for the Daybook client core.
//!
//! This crate provides:
//! - [`StateStore`]: a minimal observable container holding one typed
//!   state value, with immediate-delivery subscriptions
//! - [`LoadingMiddleware`]: a shared busy flag wrapping async work
//! - [`ErrorMiddleware`]: normalized failure broadcast with a
//!   swallow-style wrapper
//!
//! UI components subscribe to these stores, receive the current state
//! immediately, and re-render on every subsequent change.

mod errors;
mod loading;
mod store;

pub use errors::{ErrorMiddleware, ErrorState};
pub use loading::{LoadingMiddleware, LoadingState};
pub use store::{StateStore, Subscription};
