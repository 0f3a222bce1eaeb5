//! Feed error types.

use daybook_types::AppError;
use thiserror::Error;

/// Error type for diary/feed operations.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Input rejected before any backend call
    #[error("{0}")]
    Validation(String),

    /// The backend answered with an error of its own
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Requested row does not exist (or is hidden by row-level security)
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FeedError> for AppError {
    fn from(error: FeedError) -> Self {
        match error {
            FeedError::Validation(message) => AppError::Validation {
                message,
                field: None,
            },
            FeedError::Api { message, .. } => AppError::Gateway {
                message,
                code: None,
            },
            FeedError::Http(e) if e.is_connect() || e.is_timeout() => {
                AppError::Network(e.to_string())
            }
            other => AppError::Unexpected(other.to_string()),
        }
    }
}

/// Result type alias using FeedError.
pub type FeedResult<T> = Result<T, FeedError>;
