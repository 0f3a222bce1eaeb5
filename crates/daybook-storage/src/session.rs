//! Typed persistence for the auth session.

use crate::{KeyValueStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use daybook_types::User;
use serde::{Deserialize, Serialize};

/// Storage key for the persisted session.
const SESSION_KEY: &str = "daybook.auth.session";

/// The persisted auth session: tokens plus the user they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

impl StoredSession {
    /// Whether the access token has expired as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the access token has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// High-level API for storing and retrieving the auth session.
pub struct SessionStore {
    storage: Box<dyn KeyValueStore>,
}

impl SessionStore {
    /// Create a new session store with the given storage backend.
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Persist the session, replacing any previous one.
    pub fn save(&self, session: &StoredSession) -> StorageResult<()> {
        let encoded = serde_json::to_string(session)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(SESSION_KEY, &encoded)
    }

    /// Load the persisted session, if any.
    ///
    /// A session that fails to decode is treated as absent and cleared,
    /// so a stale format from an older client version cannot wedge
    /// startup.
    pub fn load(&self) -> StorageResult<Option<StoredSession>> {
        let Some(encoded) = self.storage.get(SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&encoded) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable persisted session");
                self.storage.delete(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    /// Remove the persisted session.
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.delete(SESSION_KEY)?;
        Ok(())
    }

    /// Whether a session is persisted (expired or not).
    pub fn has_session(&self) -> StorageResult<bool> {
        self.storage.has(SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use chrono::Duration;

    fn sample_session(expires_in: Duration) -> StoredSession {
        StoredSession {
            access_token: "access-token".to_string(),
            refresh_token: "refresh-token".to_string(),
            user: User {
                id: "user-123".to_string(),
                email: "a@b.com".to_string(),
                created_at: Utc::now(),
                updated_at: None,
                email_confirmed_at: None,
                last_sign_in_at: None,
            },
            expires_at: Utc::now() + expires_in,
        }
    }

    fn store() -> SessionStore {
        SessionStore::new(Box::new(MemoryStore::new()))
    }

    #[test]
    fn save_load_roundtrip() {
        let store = store();
        let session = sample_session(Duration::hours(1));

        store.save(&session).unwrap();
        let loaded = store.load().unwrap().expect("session present");

        assert_eq!(loaded, session);
        assert!(store.has_session().unwrap());
    }

    #[test]
    fn load_empty_store() {
        let store = store();
        assert!(store.load().unwrap().is_none());
        assert!(!store.has_session().unwrap());
    }

    #[test]
    fn clear_removes_session() {
        let store = store();
        store.save(&sample_session(Duration::hours(1))).unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn undecodable_session_is_discarded() {
        let backend = MemoryStore::new();
        backend.set(SESSION_KEY, "{not valid").unwrap();
        let store = SessionStore::new(Box::new(backend));

        assert!(store.load().unwrap().is_none());
        // The bad entry is gone after the failed load.
        assert!(!store.has_session().unwrap());
    }

    #[test]
    fn expiry_check() {
        let fresh = sample_session(Duration::hours(1));
        assert!(!fresh.is_expired());

        let stale = sample_session(Duration::hours(-1));
        assert!(stale.is_expired());
    }
}
