//! Authentication error types.

use daybook_types::AppError;
use thiserror::Error;

/// Authentication error type.
///
/// Every failure carries the exact message published to the auth state
/// store, so callers can use either channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Input rejected before the gateway was called
    #[error("{0}")]
    Validation(String),

    /// The gateway completed the call and reported an error
    #[error("{message}")]
    Gateway {
        message: String,
        code: Option<String>,
    },

    /// Anything else, collapsed to a fixed per-operation message
    #[error("{0}")]
    Unexpected(String),

    /// The session machine rejected the operation in the current phase
    #[error("Invalid auth state transition: {0}")]
    InvalidStateTransition(String),
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Validation(message) => AppError::Validation {
                message,
                field: None,
            },
            AuthError::Gateway { message, code } => AppError::Gateway { message, code },
            AuthError::Unexpected(message) => AppError::Unexpected(message),
            AuthError::InvalidStateTransition(detail) => AppError::Auth(detail),
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
