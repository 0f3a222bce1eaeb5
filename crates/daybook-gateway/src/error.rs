//! Gateway error types.

use daybook_types::AppError;
use thiserror::Error;

/// Gateway error type.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The backend answered with an error of its own.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        /// Backend error code, when present in the response body.
        code: Option<String>,
    },

    /// Token refresh error
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Refresh retries exhausted
    #[error("Token refresh failed after {0} attempts")]
    RefreshExhausted(u32),

    /// No persisted session
    #[error("Not logged in")]
    NotLoggedIn,

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] daybook_storage::StorageError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Returns true if this error is transient and the operation can be
    /// retried: connection failures, timeouts, and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Api { status, .. } => *status >= 500,
            GatewayError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            _ => false,
        }
    }

    /// Whether the backend itself reported this failure (as opposed to
    /// a transport or decode problem on the way there).
    pub fn is_api_error(&self) -> bool {
        matches!(self, GatewayError::Api { .. })
    }
}

/// Adapter into the closed application error taxonomy. This is the
/// only place backend failures become UI-facing errors.
impl From<GatewayError> for AppError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Api { message, code, .. } => AppError::Gateway { message, code },
            GatewayError::Http(e) if e.is_connect() || e.is_timeout() => {
                AppError::Network(e.to_string())
            }
            GatewayError::NotLoggedIn => AppError::Auth("Not logged in".to_string()),
            GatewayError::TokenRefresh(message) => AppError::Auth(message),
            GatewayError::RefreshExhausted(attempts) => {
                AppError::Auth(format!("Token refresh failed after {} attempts", attempts))
            }
            other => AppError::Unexpected(other.to_string()),
        }
    }
}

/// Result type alias using GatewayError.
pub type GatewayResult<T> = Result<T, GatewayError>;
