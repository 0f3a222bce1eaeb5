//! Data REST client for diary posts, shared posts, likes, and profiles.

use crate::{FeedContext, FeedError, FeedResult};
use async_trait::async_trait;
use daybook_types::{
    FeedSort, NewPersonalPost, PersonalPost, PersonalPostUpdate, PostLike, SharedPost, UserProfile,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// Columns selected for the shared feed, with the diary entry embedded
/// through the `personal_posts` foreign key.
const SHARED_POSTS_SELECT: &str = "id,personal_post_id,user_id,shared_at,likes_count,comments_count,\
     personal_posts!inner(id,user_id,title,content,mood,tags,is_private,is_shared,created_at,updated_at)";

/// Error body shape the data endpoints answer with.
#[derive(Debug, Default, Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// The data-surface operations the services are built on.
///
/// [`PostsClient`] is the production implementation; tests script a
/// double instead of standing up a backend.
#[async_trait]
pub trait PostsApi: Send + Sync {
    async fn list_personal_posts(&self, ctx: &FeedContext) -> FeedResult<Vec<PersonalPost>>;
    async fn insert_personal_post(
        &self,
        post: &NewPersonalPost,
        ctx: &FeedContext,
    ) -> FeedResult<PersonalPost>;
    async fn update_personal_post(
        &self,
        post_id: &str,
        update: &PersonalPostUpdate,
        ctx: &FeedContext,
    ) -> FeedResult<PersonalPost>;
    async fn delete_personal_post(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<()>;
    async fn insert_shared_post(&self, personal_post_id: &str, ctx: &FeedContext)
        -> FeedResult<()>;
    async fn fetch_shared_posts(
        &self,
        sort: FeedSort,
        ctx: &FeedContext,
    ) -> FeedResult<Vec<SharedPost>>;
    async fn fetch_like(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<Option<PostLike>>;
    async fn insert_like(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<()>;
    async fn delete_like(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<()>;
    async fn set_likes_count(
        &self,
        shared_post_id: &str,
        likes_count: i64,
        ctx: &FeedContext,
    ) -> FeedResult<()>;
    async fn fetch_profile(
        &self,
        user_id: &str,
        ctx: &FeedContext,
    ) -> FeedResult<Option<UserProfile>>;
}

/// REST client for the backend's data surface.
#[derive(Clone)]
pub struct PostsClient {
    http_client: reqwest::Client,
    api_url: String,
    anon_key: String,
}

impl PostsClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_url` - The backend project URL (e.g., `https://xyz.supabase.co`)
    /// * `anon_key` - The publishable API key
    pub fn new(api_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Build the REST API URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    fn get(&self, url: &str, ctx: &FeedContext) -> reqwest::RequestBuilder {
        self.http_client
            .get(url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", ctx.access_token))
            .header("Accept", "application/json")
    }

    fn mutate(&self, builder: reqwest::RequestBuilder, ctx: &FeedContext) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", ctx.access_token))
            .header("Content-Type", "application/json")
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> FeedResult<T> {
        if !response.status().is_success() {
            return Err(rest_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn expect_success(response: reqwest::Response) -> FeedResult<()> {
        if !response.status().is_success() {
            return Err(rest_error(response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl PostsApi for PostsClient {
    async fn list_personal_posts(&self, ctx: &FeedContext) -> FeedResult<Vec<PersonalPost>> {
        let url = format!(
            "{}?user_id=eq.{}&select=*&order=created_at.desc",
            self.rest_url("personal_posts"),
            ctx.user_id
        );

        debug!(url = %url, "Fetching personal posts");
        let response = self.get(&url, ctx).send().await?;
        Self::read_json(response).await
    }

    async fn insert_personal_post(
        &self,
        post: &NewPersonalPost,
        ctx: &FeedContext,
    ) -> FeedResult<PersonalPost> {
        let url = self.rest_url("personal_posts");

        debug!(url = %url, title = %post.title, "Creating personal post");
        let response = self
            .mutate(self.http_client.post(&url), ctx)
            .header("Prefer", "return=representation")
            .json(post)
            .send()
            .await?;

        let mut rows: Vec<PersonalPost> = Self::read_json(response).await?;
        rows.pop()
            .ok_or_else(|| FeedError::NotFound("inserted personal post".to_string()))
    }

    async fn update_personal_post(
        &self,
        post_id: &str,
        update: &PersonalPostUpdate,
        ctx: &FeedContext,
    ) -> FeedResult<PersonalPost> {
        let url = format!("{}?id=eq.{}", self.rest_url("personal_posts"), post_id);

        debug!(url = %url, "Updating personal post");
        let response = self
            .mutate(self.http_client.patch(&url), ctx)
            .header("Prefer", "return=representation")
            .json(update)
            .send()
            .await?;

        let mut rows: Vec<PersonalPost> = Self::read_json(response).await?;
        rows.pop()
            .ok_or_else(|| FeedError::NotFound(format!("personal post {}", post_id)))
    }

    async fn delete_personal_post(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<()> {
        let url = format!("{}?id=eq.{}", self.rest_url("personal_posts"), post_id);

        debug!(url = %url, "Deleting personal post");
        let response = self
            .mutate(self.http_client.delete(&url), ctx)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    async fn insert_shared_post(
        &self,
        personal_post_id: &str,
        ctx: &FeedContext,
    ) -> FeedResult<()> {
        let url = self.rest_url("shared_posts");

        debug!(personal_post_id = %personal_post_id, "Publishing post to the shared feed");
        let response = self
            .mutate(self.http_client.post(&url), ctx)
            .json(&serde_json::json!({
                "personal_post_id": personal_post_id,
                "user_id": ctx.user_id,
            }))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    async fn fetch_shared_posts(
        &self,
        sort: FeedSort,
        ctx: &FeedContext,
    ) -> FeedResult<Vec<SharedPost>> {
        let url = format!(
            "{}?select={}&personal_posts.is_shared=eq.true&order={}",
            self.rest_url("shared_posts"),
            SHARED_POSTS_SELECT,
            sort.order_expr()
        );

        debug!(url = %url, "Fetching shared posts");
        let response = self.get(&url, ctx).send().await?;
        Self::read_json(response).await
    }

    async fn fetch_like(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<Option<PostLike>> {
        let url = format!(
            "{}?post_id=eq.{}&user_id=eq.{}&select=id,post_id,user_id,created_at&limit=1",
            self.rest_url("post_likes"),
            post_id,
            ctx.user_id
        );

        let response = self.get(&url, ctx).send().await?;
        let rows: Vec<PostLike> = Self::read_json(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_like(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<()> {
        let url = self.rest_url("post_likes");

        let response = self
            .mutate(self.http_client.post(&url), ctx)
            .json(&serde_json::json!({
                "post_id": post_id,
                "user_id": ctx.user_id,
            }))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    async fn delete_like(&self, post_id: &str, ctx: &FeedContext) -> FeedResult<()> {
        let url = format!(
            "{}?post_id=eq.{}&user_id=eq.{}",
            self.rest_url("post_likes"),
            post_id,
            ctx.user_id
        );

        let response = self
            .mutate(self.http_client.delete(&url), ctx)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    async fn set_likes_count(
        &self,
        shared_post_id: &str,
        likes_count: i64,
        ctx: &FeedContext,
    ) -> FeedResult<()> {
        let url = format!("{}?id=eq.{}", self.rest_url("shared_posts"), shared_post_id);

        let response = self
            .mutate(self.http_client.patch(&url), ctx)
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "likes_count": likes_count }))
            .send()
            .await?;
        Self::expect_success(response).await
    }

    async fn fetch_profile(
        &self,
        user_id: &str,
        ctx: &FeedContext,
    ) -> FeedResult<Option<UserProfile>> {
        let url = format!(
            "{}?user_id=eq.{}&select=id,user_id,username,display_name,bio,avatar_url&limit=1",
            self.rest_url("user_profiles"),
            user_id
        );

        let response = self.get(&url, ctx).send().await?;
        let rows: Vec<UserProfile> = Self::read_json(response).await?;
        Ok(rows.into_iter().next())
    }
}

/// Turn an unsuccessful data response into a [`FeedError::Api`].
async fn rest_error(response: reqwest::Response) -> FeedError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let parsed: RestErrorBody = serde_json::from_str(&body).unwrap_or_default();

    tracing::warn!(status = status, body = %body, "Data request failed");
    FeedError::Api {
        status,
        message: parsed.message.unwrap_or_else(|| format!("HTTP {}", status)),
    }
}
