//! The closed application error taxonomy.
//!
//! Failures from every subsystem are adapted into this one enum before
//! they reach UI-facing state, so observers match on variants and
//! stable codes instead of sniffing fields off arbitrary values.

use thiserror::Error;

/// Application-level error presented to UI-facing state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Input rejected before any backend call.
    #[error("{message}")]
    Validation {
        message: String,
        /// Offending form field, when known.
        field: Option<String>,
    },

    /// Authentication or session failure.
    #[error("{0}")]
    Auth(String),

    /// Transport-level failure (connection, timeout).
    #[error("{0}")]
    Network(String),

    /// The backend answered with an error of its own.
    #[error("{message}")]
    Gateway {
        message: String,
        /// Backend-provided code, when present.
        code: Option<String>,
    },

    /// Anything else, collapsed to a displayable message.
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    /// Convenience constructor for a field-less validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Network(_) => "NETWORK_ERROR",
            AppError::Gateway { code, .. } => code.as_deref().unwrap_or("GATEWAY_ERROR"),
            AppError::Unexpected(_) => "UNKNOWN_ERROR",
        }
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_and_code() {
        let err = AppError::validation("Please fill in title and content");
        assert_eq!(err.to_string(), "Please fill in title and content");
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn gateway_error_prefers_backend_code() {
        let err = AppError::Gateway {
            message: "duplicate key".to_string(),
            code: Some("23505".to_string()),
        };
        assert_eq!(err.code(), "23505");

        let err = AppError::Gateway {
            message: "unknown".to_string(),
            code: None,
        };
        assert_eq!(err.code(), "GATEWAY_ERROR");
    }

    #[test]
    fn unexpected_error_code() {
        assert_eq!(AppError::Unexpected("boom".to_string()).code(), "UNKNOWN_ERROR");
    }
}
