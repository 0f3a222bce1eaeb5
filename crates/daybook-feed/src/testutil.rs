//! Scripted data-surface double shared by the service tests.

use crate::{FeedContext, FeedError, FeedResult, PostsApi};
use async_trait::async_trait;
use chrono::Utc;
use daybook_types::{
    FeedSort, NewPersonalPost, PersonalPost, PersonalPostUpdate, PostLike, SharedPost, UserProfile,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

pub fn sample_post(id: &str, user_id: &str) -> PersonalPost {
    PersonalPost {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: format!("Entry {}", id),
        content: "Some thoughts.".to_string(),
        mood: None,
        tags: Vec::new(),
        is_private: true,
        is_shared: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn sample_shared_post(
    id: &str,
    personal_post_id: &str,
    user_id: &str,
    likes_count: i64,
) -> SharedPost {
    let mut post = sample_post(personal_post_id, user_id);
    post.is_private = false;
    post.is_shared = true;

    SharedPost {
        id: id.to_string(),
        personal_post_id: personal_post_id.to_string(),
        user_id: user_id.to_string(),
        shared_at: Utc::now(),
        likes_count,
        comments_count: 0,
        post,
        author: None,
        is_liked: false,
    }
}

/// In-memory [`PostsApi`] double: rows live in vectors, failures are
/// scripted one call ahead.
#[derive(Default)]
pub struct ScriptedPostsApi {
    personal_posts: Mutex<Vec<PersonalPost>>,
    shared_posts: Mutex<Vec<SharedPost>>,
    likes: Mutex<HashSet<(String, String)>>,
    profiles: Mutex<Vec<UserProfile>>,
    failures: Mutex<VecDeque<FeedError>>,
    inserts: AtomicUsize,
    shared_inserts: Mutex<Vec<String>>,
    likes_count_writes: Mutex<Vec<(String, i64)>>,
}

impl ScriptedPostsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_personal_post(&self, post: PersonalPost) {
        self.personal_posts.lock().unwrap().push(post);
    }

    pub fn push_shared_post(&self, post: SharedPost) {
        self.shared_posts.lock().unwrap().push(post);
    }

    pub fn set_liked(&self, shared_post_id: &str, user_id: &str) {
        self.likes
            .lock()
            .unwrap()
            .insert((shared_post_id.to_string(), user_id.to_string()));
    }

    pub fn set_profile(&self, user_id: &str, display_name: &str) {
        self.profiles.lock().unwrap().push(UserProfile {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            username: None,
            display_name: Some(display_name.to_string()),
            bio: None,
            avatar_url: None,
        });
    }

    /// Fail the next API call with `error`.
    pub fn fail_next(&self, error: FeedError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn shared_inserts(&self) -> Vec<String> {
        self.shared_inserts.lock().unwrap().clone()
    }

    pub fn likes_count_writes(&self) -> Vec<(String, i64)> {
        self.likes_count_writes.lock().unwrap().clone()
    }

    fn take_failure(&self) -> Option<FeedError> {
        self.failures.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl PostsApi for ScriptedPostsApi {
    async fn list_personal_posts(&self, ctx: &FeedContext) -> FeedResult<Vec<PersonalPost>> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        Ok(self
            .personal_posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == ctx.user_id)
            .cloned()
            .collect())
    }

    async fn insert_personal_post(
        &self,
        post: &NewPersonalPost,
        _ctx: &FeedContext,
    ) -> FeedResult<PersonalPost> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);

        let stored = PersonalPost {
            id: Uuid::new_v4().to_string(),
            user_id: post.user_id.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            mood: post.mood.clone(),
            tags: post.tags.clone(),
            is_private: post.is_private,
            is_shared: post.is_shared,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.personal_posts.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn update_personal_post(
        &self,
        post_id: &str,
        update: &PersonalPostUpdate,
        _ctx: &FeedContext,
    ) -> FeedResult<PersonalPost> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }

        let mut posts = self.personal_posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| FeedError::NotFound(format!("personal post {}", post_id)))?;

        if let Some(title) = &update.title {
            post.title = title.clone();
        }
        if let Some(content) = &update.content {
            post.content = content.clone();
        }
        if let Some(mood) = &update.mood {
            post.mood = Some(mood.clone());
        }
        if let Some(tags) = &update.tags {
            post.tags = tags.clone();
        }
        if let Some(is_shared) = update.is_shared {
            post.is_shared = is_shared;
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete_personal_post(&self, post_id: &str, _ctx: &FeedContext) -> FeedResult<()> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        self.personal_posts
            .lock()
            .unwrap()
            .retain(|p| p.id != post_id);
        Ok(())
    }

    async fn insert_shared_post(
        &self,
        personal_post_id: &str,
        _ctx: &FeedContext,
    ) -> FeedResult<()> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        self.shared_inserts
            .lock()
            .unwrap()
            .push(personal_post_id.to_string());
        Ok(())
    }

    async fn fetch_shared_posts(
        &self,
        _sort: FeedSort,
        _ctx: &FeedContext,
    ) -> FeedResult<Vec<SharedPost>> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        Ok(self.shared_posts.lock().unwrap().clone())
    }

    async fn fetch_like(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<Option<PostLike>> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        let liked = self
            .likes
            .lock()
            .unwrap()
            .contains(&(post_id.to_string(), ctx.user_id.clone()));

        Ok(liked.then(|| PostLike {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            user_id: ctx.user_id.clone(),
            created_at: Utc::now(),
        }))
    }

    async fn insert_like(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<()> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        self.likes
            .lock()
            .unwrap()
            .insert((post_id.to_string(), ctx.user_id.clone()));
        Ok(())
    }

    async fn delete_like(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<()> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        self.likes
            .lock()
            .unwrap()
            .remove(&(post_id.to_string(), ctx.user_id.clone()));
        Ok(())
    }

    async fn set_likes_count(
        &self,
        shared_post_id: &str,
        likes_count: i64,
        _ctx: &FeedContext,
    ) -> FeedResult<()> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        self.likes_count_writes
            .lock()
            .unwrap()
            .push((shared_post_id.to_string(), likes_count));

        let mut shared = self.shared_posts.lock().unwrap();
        if let Some(entry) = shared.iter_mut().find(|s| s.id == shared_post_id) {
            entry.likes_count = likes_count;
        }
        Ok(())
    }

    async fn fetch_profile(
        &self,
        user_id: &str,
        _ctx: &FeedContext,
    ) -> FeedResult<Option<UserProfile>> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }
}
