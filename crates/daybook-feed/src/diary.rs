//! The user's own diary posts behind an observable store.

use crate::{FeedContext, FeedError, FeedResult, PostsApi};
use daybook_state::{StateStore, Subscription};
use daybook_types::{NewPersonalPost, PersonalPost, PersonalPostUpdate};
use std::sync::Arc;
use tracing::{info, warn};

/// Message published when a post form is incomplete.
const MSG_MISSING_FIELDS: &str = "Please fill in title and content";

/// Diary list state broadcast to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiaryState {
    /// Own posts, newest first.
    pub posts: Vec<PersonalPost>,
    pub loading: bool,
    pub error: Option<String>,
}

/// CRUD over the user's own diary posts, published through a
/// [`StateStore`] so list views re-render on every change.
pub struct DiaryService {
    client: Arc<dyn PostsApi>,
    store: StateStore<DiaryState>,
}

impl DiaryService {
    pub fn new(client: Arc<dyn PostsApi>) -> Self {
        Self {
            client,
            store: StateStore::new(DiaryState::default()),
        }
    }

    /// Subscribe to diary list changes; the listener is invoked
    /// immediately with the current state.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DiaryState) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Current diary list snapshot.
    pub fn state(&self) -> DiaryState {
        self.store.get()
    }

    /// Reload the user's posts, newest first.
    pub async fn refresh(&self, ctx: &FeedContext) -> FeedResult<()> {
        self.store.update(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.client.list_personal_posts(ctx).await {
            Ok(posts) => {
                self.store.update(|s| {
                    s.posts = posts;
                    s.loading = false;
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch diary posts");
                self.store.update(|s| {
                    s.loading = false;
                    s.error = Some(e.to_string());
                });
                Err(e)
            }
        }
    }

    /// Create a post. Title and content are trimmed and required; new
    /// posts start private and unshared.
    pub async fn create(
        &self,
        ctx: &FeedContext,
        title: &str,
        content: &str,
        mood: Option<&str>,
        tags: Vec<String>,
    ) -> FeedResult<PersonalPost> {
        let title = title.trim();
        let content = content.trim();

        if title.is_empty() || content.is_empty() {
            self.store
                .update(|s| s.error = Some(MSG_MISSING_FIELDS.to_string()));
            return Err(FeedError::Validation(MSG_MISSING_FIELDS.to_string()));
        }

        let new_post = NewPersonalPost {
            user_id: ctx.user_id.clone(),
            title: title.to_string(),
            content: content.to_string(),
            mood: mood.map(str::to_string),
            tags,
            is_private: true,
            is_shared: false,
        };

        let post = self.client.insert_personal_post(&new_post, ctx).await?;
        info!(post_id = %post.id, "Diary post created");

        self.store.update(|s| {
            s.posts.insert(0, post.clone());
            s.error = None;
        });
        Ok(post)
    }

    /// Update an owned post and replace it in the list.
    pub async fn update_post(
        &self,
        ctx: &FeedContext,
        post_id: &str,
        update: PersonalPostUpdate,
    ) -> FeedResult<PersonalPost> {
        let updated = self
            .client
            .update_personal_post(post_id, &update, ctx)
            .await?;

        self.store.update(|s| {
            if let Some(slot) = s.posts.iter_mut().find(|p| p.id == post_id) {
                *slot = updated.clone();
            }
            s.error = None;
        });
        Ok(updated)
    }

    /// Delete an owned post and drop it from the list.
    pub async fn delete_post(&self, ctx: &FeedContext, post_id: &str) -> FeedResult<()> {
        self.client.delete_personal_post(post_id, ctx).await?;
        info!(post_id = %post_id, "Diary post deleted");

        self.store.update(|s| {
            s.posts.retain(|p| p.id != post_id);
            s.error = None;
        });
        Ok(())
    }

    /// Publish a post to the shared feed: flip its shared flag, then
    /// insert the feed row.
    pub async fn share(&self, ctx: &FeedContext, post_id: &str) -> FeedResult<()> {
        let update = PersonalPostUpdate {
            is_shared: Some(true),
            ..Default::default()
        };
        self.client
            .update_personal_post(post_id, &update, ctx)
            .await?;
        self.client.insert_shared_post(post_id, ctx).await?;
        info!(post_id = %post_id, "Diary post shared");

        self.store.update(|s| {
            if let Some(post) = s.posts.iter_mut().find(|p| p.id == post_id) {
                post.is_shared = true;
            }
            s.error = None;
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sample_post, ScriptedPostsApi};

    fn ctx() -> FeedContext {
        FeedContext {
            user_id: "user-1".to_string(),
            access_token: "token".to_string(),
        }
    }

    #[tokio::test]
    async fn refresh_publishes_posts() {
        let api = Arc::new(ScriptedPostsApi::new());
        api.push_personal_post(sample_post("p-1", "user-1"));
        let service = DiaryService::new(api);

        service.refresh(&ctx()).await.unwrap();

        let state = service.state();
        assert_eq!(state.posts.len(), 1);
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn refresh_failure_publishes_error() {
        let api = Arc::new(ScriptedPostsApi::new());
        api.fail_next(FeedError::Api {
            status: 500,
            message: "storage offline".to_string(),
        });
        let service = DiaryService::new(api);

        let result = service.refresh(&ctx()).await;

        assert!(result.is_err());
        let state = service.state();
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("storage offline"));
    }

    #[tokio::test]
    async fn create_requires_title_and_content() {
        let api = Arc::new(ScriptedPostsApi::new());
        let service = DiaryService::new(api.clone());

        let result = service.create(&ctx(), "  ", "content", None, vec![]).await;

        assert!(matches!(result, Err(FeedError::Validation(_))));
        assert_eq!(api.insert_count(), 0);
        assert_eq!(
            service.state().error.as_deref(),
            Some("Please fill in title and content")
        );
    }

    #[tokio::test]
    async fn create_trims_and_prepends_the_new_post() {
        let api = Arc::new(ScriptedPostsApi::new());
        api.push_personal_post(sample_post("p-existing", "user-1"));
        let service = DiaryService::new(api);
        service.refresh(&ctx()).await.unwrap();

        let post = service
            .create(&ctx(), "  A quiet day  ", "  Rain all morning.  ", Some("calm"), vec![])
            .await
            .unwrap();

        assert_eq!(post.title, "A quiet day");
        assert_eq!(post.content, "Rain all morning.");

        let state = service.state();
        assert_eq!(state.posts.len(), 2);
        assert_eq!(state.posts[0].id, post.id);
    }

    #[tokio::test]
    async fn delete_drops_the_post_from_the_list() {
        let api = Arc::new(ScriptedPostsApi::new());
        api.push_personal_post(sample_post("p-1", "user-1"));
        let service = DiaryService::new(api);
        service.refresh(&ctx()).await.unwrap();

        service.delete_post(&ctx(), "p-1").await.unwrap();

        assert!(service.state().posts.is_empty());
    }

    #[tokio::test]
    async fn share_flips_the_local_shared_flag() {
        let api = Arc::new(ScriptedPostsApi::new());
        api.push_personal_post(sample_post("p-1", "user-1"));
        let service = DiaryService::new(api.clone());
        service.refresh(&ctx()).await.unwrap();

        service.share(&ctx(), "p-1").await.unwrap();

        assert!(service.state().posts[0].is_shared);
        assert_eq!(api.shared_inserts(), vec!["p-1".to_string()]);
    }
}
