//! User and profile records.
//!
//! Field names match the backend's column names so these types
//! deserialize straight from REST responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated user as reported by the backend's auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User UUID.
    pub id: String,
    /// Sign-in email address.
    pub email: String,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Set once the address has been confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

/// Public profile row attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Profile UUID.
    pub id: String,
    /// Owning user UUID.
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Name shown next to a post: display name, else username, else a
    /// truncated user id.
    pub fn label(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(name) = self.username.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        anonymous_label(&self.user_id)
    }
}

/// Fallback label for an author without a profile.
pub(crate) fn anonymous_label(user_id: &str) -> String {
    let short: String = user_id.chars().take(8).collect();
    format!("User {}", short)
}
