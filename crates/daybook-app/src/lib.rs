//! The single entry point composing the Daybook client core.
//!
//! [`AppRuntime`] wires the auth controller, the loading and error
//! middlewares, and the diary/feed services together and offers the
//! convenience operations UI code calls ("sign in, while showing a
//! loading indicator, while capturing errors").
//!
//! The runtime is constructed explicitly and handed to callers;
//! keeping exactly one live instance per process is the embedding
//! application's invariant.

mod runtime;

pub use runtime::AppRuntime;
