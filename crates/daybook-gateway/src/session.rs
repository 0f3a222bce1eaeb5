//! Session types shared by gateway implementations.

use chrono::{DateTime, Utc};
use daybook_storage::StoredSession;
use daybook_types::User;
use serde::{Deserialize, Serialize};

/// An active backend session.
///
/// At most one session is active per running client; the gateway owns
/// its lifecycle and mirrors it into local persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the access token has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Session {
            user: stored.user,
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            expires_at: stored.expires_at,
        }
    }
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        StoredSession {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            user: session.user.clone(),
            expires_at: session.expires_at,
        }
    }
}

/// What happened to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session was opened by sign-in or sign-up.
    SignedIn,
    /// The session ended: sign-out, or expiry the gateway could not
    /// recover from.
    SignedOut,
    /// Tokens were refreshed; the session stays open.
    TokenRefreshed,
}

/// Push-style session-change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub event: SessionEvent,
    /// The session after the change; `None` once it is gone.
    pub session: Option<Session>,
}

impl SessionChange {
    pub fn signed_in(session: Session) -> Self {
        SessionChange {
            event: SessionEvent::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        SessionChange {
            event: SessionEvent::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        SessionChange {
            event: SessionEvent::TokenRefreshed,
            session: Some(session),
        }
    }
}
