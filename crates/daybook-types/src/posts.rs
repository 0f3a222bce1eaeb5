//! Diary post and public feed records.

use crate::user::anonymous_label;
use crate::UserProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A private diary entry owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalPost {
    /// Post UUID.
    pub id: String,
    /// Owning user UUID.
    pub user_id: String,
    pub title: String,
    pub content: String,
    /// Optional mood key ("happy", "calm", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Private entries are only visible to their owner.
    pub is_private: bool,
    /// Set once the entry has been published to the shared feed.
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a diary entry.
#[derive(Debug, Clone, Serialize)]
pub struct NewPersonalPost {
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    pub tags: Vec<String>,
    pub is_private: bool,
    pub is_shared: bool,
}

/// Partial update for a diary entry. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonalPostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_shared: Option<bool>,
}

/// A shared feed row: the denormalized view of one published entry.
///
/// `likes_count`/`comments_count` are maintained by the backend and
/// adjusted optimistically on the client while a like write is in
/// flight. `author` and `is_liked` are filled in by the feed
/// aggregation, not by the `shared_posts` table itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedPost {
    /// Shared-post UUID (distinct from the personal post's id).
    pub id: String,
    pub personal_post_id: String,
    pub user_id: String,
    pub shared_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
    /// The embedded diary entry.
    #[serde(rename = "personal_posts")]
    pub post: PersonalPost,
    /// Author display label, resolved from the profile table.
    #[serde(default)]
    pub author: Option<String>,
    /// Whether the viewing user has liked this post.
    #[serde(default)]
    pub is_liked: bool,
}

impl SharedPost {
    /// Author label with the anonymous fallback applied.
    pub fn author_label(&self) -> String {
        match self.author.as_deref().filter(|a| !a.is_empty()) {
            Some(author) => author.to_string(),
            None => anonymous_label(&self.user_id),
        }
    }

    /// Resolve the author label from a profile lookup result.
    pub fn with_author(mut self, profile: Option<&UserProfile>) -> Self {
        self.author = Some(match profile {
            Some(profile) => profile.label(),
            None => anonymous_label(&self.user_id),
        });
        self
    }
}

/// A like row linking a user to a shared post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostLike {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Feed ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSort {
    /// Most recently shared first.
    Recent,
    /// Most liked first.
    Popular,
}

impl FeedSort {
    /// PostgREST `order=` expression for this sort.
    pub fn order_expr(&self) -> &'static str {
        match self {
            FeedSort::Recent => "shared_at.desc",
            FeedSort::Popular => "likes_count.desc",
        }
    }
}
