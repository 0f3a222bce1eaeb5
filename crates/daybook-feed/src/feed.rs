//! The aggregated public feed with optimistic like counters.

use crate::{FeedContext, FeedError, FeedResult, PostsApi};
use daybook_state::{StateStore, Subscription};
use daybook_types::{FeedSort, SharedPost};
use std::sync::Arc;
use tracing::{debug, warn};

/// Feed state broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    pub entries: Vec<SharedPost>,
    pub sort: FeedSort,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for FeedState {
    fn default() -> Self {
        FeedState {
            entries: Vec::new(),
            sort: FeedSort::Recent,
            loading: false,
            error: None,
        }
    }
}

/// The shared public feed: denormalized rows aggregated per viewer,
/// with like toggles applied optimistically.
pub struct FeedService {
    client: Arc<dyn PostsApi>,
    store: StateStore<FeedState>,
}

impl FeedService {
    pub fn new(client: Arc<dyn PostsApi>) -> Self {
        Self {
            client,
            store: StateStore::new(FeedState::default()),
        }
    }

    /// Subscribe to feed changes; the listener is invoked immediately
    /// with the current state.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&FeedState) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Current feed snapshot.
    pub fn state(&self) -> FeedState {
        self.store.get()
    }

    /// Reload the feed in the given order.
    ///
    /// Each row is aggregated for the viewing user: their like status
    /// from `post_likes` and the author label from `user_profiles`.
    pub async fn refresh(&self, ctx: &FeedContext, sort: FeedSort) -> FeedResult<()> {
        self.store.update(|s| {
            s.sort = sort;
            s.loading = true;
            s.error = None;
        });

        let rows = match self.client.fetch_shared_posts(sort, ctx).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Failed to fetch shared posts");
                self.store.update(|s| {
                    s.loading = false;
                    s.error = Some(e.to_string());
                });
                return Err(e);
            }
        };

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let is_liked = self.client.fetch_like(&row.id, ctx).await?.is_some();
            let profile = self.client.fetch_profile(&row.user_id, ctx).await?;
            let mut entry = row.with_author(profile.as_ref());
            entry.is_liked = is_liked;
            entries.push(entry);
        }

        debug!(count = entries.len(), "Feed refreshed");
        self.store.update(|s| {
            s.entries = entries;
            s.loading = false;
        });
        Ok(())
    }

    /// Toggle the viewer's like on a feed entry.
    ///
    /// The local counter and flag flip first so the UI reacts
    /// immediately; the backend writes follow. If they fail, the local
    /// state is reverted and the error published.
    pub async fn toggle_like(&self, ctx: &FeedContext, shared_post_id: &str) -> FeedResult<()> {
        let Some(entry) = self
            .store
            .get()
            .entries
            .into_iter()
            .find(|e| e.id == shared_post_id)
        else {
            return Err(FeedError::NotFound(format!(
                "shared post {}",
                shared_post_id
            )));
        };

        let was_liked = entry.is_liked;
        let old_count = entry.likes_count;
        let new_count = if was_liked {
            (old_count - 1).max(0)
        } else {
            old_count + 1
        };

        // Optimistic flip before any backend write.
        self.apply_like(shared_post_id, !was_liked, new_count);

        let result = if was_liked {
            match self.client.delete_like(shared_post_id, ctx).await {
                Ok(()) => self.client.set_likes_count(shared_post_id, new_count, ctx).await,
                Err(e) => Err(e),
            }
        } else {
            match self.client.insert_like(shared_post_id, ctx).await {
                Ok(()) => self.client.set_likes_count(shared_post_id, new_count, ctx).await,
                Err(e) => Err(e),
            }
        };

        if let Err(e) = result {
            warn!(error = %e, shared_post_id = %shared_post_id, "Like toggle failed, reverting");
            self.apply_like(shared_post_id, was_liked, old_count);
            self.store.update(|s| s.error = Some(e.to_string()));
            return Err(e);
        }

        Ok(())
    }

    /// Total likes across the loaded feed.
    pub fn total_likes(&self) -> i64 {
        self.store
            .get()
            .entries
            .iter()
            .map(|e| e.likes_count)
            .sum()
    }

    fn apply_like(&self, shared_post_id: &str, is_liked: bool, likes_count: i64) {
        self.store.update(|s| {
            if let Some(entry) = s.entries.iter_mut().find(|e| e.id == shared_post_id) {
                entry.is_liked = is_liked;
                entry.likes_count = likes_count;
            }
        });
    }
}
