//! Configuration and shared utilities for the Daybook client core.
//!
//! This crate provides:
//! - Typed configuration with compile-time backend defaults
//! - File system paths under `~/.daybook`
//! - Logging initialization for the `tracing` stack

mod config;
mod error;
pub mod logging;
mod paths;

pub use config::{
    Config, Environment, DEFAULT_LOG_LEVEL, DEFAULT_SUPABASE_PUBLISHABLE_KEY, DEFAULT_SUPABASE_URL,
};
pub use error::{CoreError, CoreResult};
pub use paths::Paths;
