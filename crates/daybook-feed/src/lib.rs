//! Diary and public feed data services for the Daybook client core.
//!
//! This crate provides:
//! - [`PostsClient`]: the hosted backend's data REST surface (diary
//!   posts, shared posts, likes, profiles)
//! - [`DiaryService`]: the user's own posts behind an observable store
//! - [`FeedService`]: the aggregated public feed with optimistic like
//!   counters
//!
//! Services authenticate per call with a [`FeedContext`] derived from
//! the active session; row-level security on the backend scopes what
//! each token can read and write.

mod client;
mod diary;
mod error;
mod feed;
#[cfg(test)]
mod testutil;

pub use client::{PostsApi, PostsClient};
pub use diary::{DiaryService, DiaryState};
pub use error::{FeedError, FeedResult};
pub use feed::{FeedService, FeedState};

/// Per-call authentication context derived from the active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedContext {
    pub user_id: String,
    pub access_token: String,
}
