//! Key-value storage abstraction for the Daybook client core.
//!
//! This crate provides:
//! - A [`KeyValueStore`] trait over simple string storage
//! - An in-memory backend for tests and ephemeral sessions
//! - A JSON-file backend mirroring the device key-value store a
//!   mobile client persists its session into
//! - A typed [`SessionStore`] wrapper for the persisted auth session

mod file;
mod memory;
mod session;
mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::{SessionStore, StoredSession};
pub use traits::KeyValueStore;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
