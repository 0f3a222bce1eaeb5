//! Hosted-backend gateway implementation.
//!
//! Talks to the Supabase auth REST surface, mirrors the session into
//! local persistence, and pushes session-change notifications to
//! subscribers after every successful auth operation or refresh.

use crate::{AuthGateway, GatewayError, GatewayResult, Session, SessionChange};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use daybook_storage::{SessionStore, StoredSession};
use daybook_types::User;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Buffered session-change notifications per subscriber.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Configuration for retry behavior during token refresh.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

impl RefreshConfig {
    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let delay_ms = self.initial_delay_ms.saturating_mul(2u64.pow(attempt));
        let capped_ms = delay_ms.min(self.max_delay_ms);
        std::time::Duration::from_millis(capped_ms)
    }
}

/// Supabase token grant request.
#[derive(Debug, Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Supabase token refresh request.
#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Supabase token response (password grant, signup, refresh).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: User,
}

/// Error body shape the auth endpoints answer with.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

/// Gateway against the hosted Supabase backend.
///
/// Session persistence matches the mobile client's behavior: the
/// session survives restarts via the [`SessionStore`], and an expired
/// access token is refreshed transparently on
/// [`current_session`](AuthGateway::current_session).
pub struct SupabaseAuthGateway {
    http_client: Client,
    supabase_url: String,
    publishable_key: String,
    sessions: SessionStore,
    refresh_config: RefreshConfig,
    events: broadcast::Sender<SessionChange>,
}

impl SupabaseAuthGateway {
    /// Create a new gateway.
    pub fn new(
        supabase_url: impl Into<String>,
        publishable_key: impl Into<String>,
        sessions: SessionStore,
    ) -> Self {
        Self::with_refresh_config(supabase_url, publishable_key, sessions, RefreshConfig::default())
    }

    /// Create a new gateway with custom refresh behavior.
    pub fn with_refresh_config(
        supabase_url: impl Into<String>,
        publishable_key: impl Into<String>,
        sessions: SessionStore,
        refresh_config: RefreshConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            http_client: Client::new(),
            supabase_url: supabase_url.into().trim_end_matches('/').to_string(),
            publishable_key: publishable_key.into(),
            sessions,
            refresh_config,
            events,
        }
    }

    /// Build an auth endpoint URL.
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.supabase_url, path)
    }

    /// Broadcast a session change. Send errors mean no subscribers, which
    /// is fine during early startup.
    fn emit(&self, change: SessionChange) {
        let _ = self.events.send(change);
    }

    /// Persist a token response and return the resulting session.
    fn store_token_response(&self, data: TokenResponse) -> GatewayResult<Session> {
        let expires_at = Utc::now() + Duration::seconds(data.expires_in);
        let stored = StoredSession {
            access_token: data.access_token,
            refresh_token: data.refresh_token,
            user: data.user,
            expires_at,
        };
        self.sessions.save(&stored)?;
        Ok(Session::from(stored))
    }

    /// Exchange credentials at a token-yielding endpoint.
    async fn token_request(&self, url: &str, email: &str, password: &str) -> GatewayResult<Session> {
        debug!(url = %url, email = %email, "Requesting auth tokens");

        let response = self
            .http_client
            .post(url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&PasswordGrantRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let data: TokenResponse = response.json().await?;
        self.store_token_response(data)
    }

    /// Refresh the session with exponential backoff retry.
    ///
    /// Transient failures are retried up to the configured limit;
    /// permanent failures and exhaustion clear the stored session.
    async fn refresh_with_backoff(&self, refresh_token: &str) -> GatewayResult<Session> {
        let mut last_error = None;

        for attempt in 0..self.refresh_config.max_retries {
            match self.try_refresh(refresh_token).await {
                Ok(session) => {
                    self.emit(SessionChange::token_refreshed(session.clone()));
                    return Ok(session);
                }
                Err(e) if e.is_transient() => {
                    last_error = Some(e);

                    if attempt + 1 < self.refresh_config.max_retries {
                        let delay = self.refresh_config.delay_for_attempt(attempt);
                        debug!(
                            attempt = attempt + 1,
                            max_retries = self.refresh_config.max_retries,
                            delay_ms = delay.as_millis(),
                            "Refresh failed with transient error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => {
                    warn!("Refresh failed with non-transient error: {}", e);
                    self.sessions.clear()?;
                    self.emit(SessionChange::signed_out());
                    return Err(e);
                }
            }
        }

        warn!(
            "Refresh failed after {} attempts",
            self.refresh_config.max_retries
        );
        self.sessions.clear()?;
        self.emit(SessionChange::signed_out());

        Err(last_error.unwrap_or(GatewayError::RefreshExhausted(self.refresh_config.max_retries)))
    }

    /// Single attempt to refresh the session.
    async fn try_refresh(&self, refresh_token: &str) -> GatewayResult<Session> {
        let refresh_url = self.auth_url("token?grant_type=refresh_token");

        debug!(url = %refresh_url, "Refreshing token");

        let response = self
            .http_client
            .post(&refresh_url)
            .header("apikey", &self.publishable_key)
            .header("Content-Type", "application/json")
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Token refresh failed");
            return Err(GatewayError::TokenRefresh(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let data: TokenResponse = response.json().await?;
        let session = self.store_token_response(data)?;

        info!(user_id = %session.user.id, "Token refreshed successfully");
        Ok(session)
    }
}

#[async_trait]
impl AuthGateway for SupabaseAuthGateway {
    async fn current_session(&self) -> GatewayResult<Option<Session>> {
        let Some(stored) = self.sessions.load()? else {
            debug!("No persisted session");
            return Ok(None);
        };

        if !stored.is_expired() {
            debug!(user_id = %stored.user.id, "Restored persisted session");
            return Ok(Some(Session::from(stored)));
        }

        info!(user_id = %stored.user.id, "Persisted session expired, attempting refresh");
        let session = self.refresh_with_backoff(&stored.refresh_token).await?;
        Ok(Some(session))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<User> {
        let url = self.auth_url("token?grant_type=password");
        let session = self.token_request(&url, email, password).await?;

        info!(user_id = %session.user.id, "Sign-in successful");
        let user = session.user.clone();
        self.emit(SessionChange::signed_in(session));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<User> {
        let url = self.auth_url("signup");
        let session = self.token_request(&url, email, password).await?;

        info!(user_id = %session.user.id, "Sign-up successful");
        let user = session.user.clone();
        self.emit(SessionChange::signed_in(session));
        Ok(user)
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        if let Some(stored) = self.sessions.load()? {
            let url = self.auth_url("logout");
            debug!(url = %url, "Signing out");

            let response = self
                .http_client
                .post(&url)
                .header("apikey", &self.publishable_key)
                .header("Authorization", format!("Bearer {}", stored.access_token))
                .send()
                .await?;

            // 401 means the token is already dead server-side; treat the
            // session as ended rather than failing the sign-out.
            if !response.status().is_success() && response.status().as_u16() != 401 {
                return Err(api_error(response).await);
            }
        }

        self.sessions.clear()?;
        self.emit(SessionChange::signed_out());

        info!("Signed out");
        Ok(())
    }

    fn on_session_change(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }
}

/// Turn an unsuccessful auth response into a [`GatewayError::Api`].
async fn api_error(response: reqwest::Response) -> GatewayError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    warn!(status = status, body = %body, "Auth request failed");
    parse_api_error(status, &body)
}

fn parse_api_error(status: u16, body: &str) -> GatewayError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .msg
        .or(parsed.message)
        .or(parsed.error_description)
        .unwrap_or_else(|| format!("HTTP {}", status));

    GatewayError::Api {
        status,
        message,
        code: parsed.error_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_storage::MemoryStore;

    fn gateway() -> SupabaseAuthGateway {
        SupabaseAuthGateway::new(
            "https://test.supabase.co/",
            "test-publishable-key",
            SessionStore::new(Box::new(MemoryStore::new())),
        )
    }

    #[test]
    fn auth_url_building() {
        let gateway = gateway();
        // Trailing slash on the project URL is normalized away.
        assert_eq!(
            gateway.auth_url("token?grant_type=password"),
            "https://test.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            gateway.auth_url("logout"),
            "https://test.supabase.co/auth/v1/logout"
        );
    }

    #[test]
    fn token_response_deserializes() {
        let json = r#"{
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {
                "id": "user-1",
                "email": "a@b.com",
                "created_at": "2025-01-15T09:30:00Z"
            }
        }"#;

        let data: TokenResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(data.access_token, "at");
        assert_eq!(data.expires_in, 3600);
        assert_eq!(data.user.email, "a@b.com");
    }

    #[test]
    fn store_token_response_persists_session() {
        let gateway = gateway();
        let data = TokenResponse {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_in: 3600,
            user: User {
                id: "user-1".to_string(),
                email: "a@b.com".to_string(),
                created_at: Utc::now(),
                updated_at: None,
                email_confirmed_at: None,
                last_sign_in_at: None,
            },
        };

        let session = gateway.store_token_response(data).unwrap();
        assert!(!session.is_expired());

        let stored = gateway.sessions.load().unwrap().expect("persisted");
        assert_eq!(stored.access_token, "at");
        assert_eq!(stored.user.id, "user-1");
    }

    #[test]
    fn parse_api_error_prefers_msg_field() {
        let err = parse_api_error(
            400,
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        match err {
            GatewayError::Api {
                status,
                message,
                code,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid login credentials");
                assert_eq!(code.as_deref(), Some("invalid_credentials"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn parse_api_error_with_unparseable_body() {
        let err = parse_api_error(502, "<html>bad gateway</html>");
        match err {
            GatewayError::Api { status, message, code } => {
                assert_eq!(status, 502);
                assert_eq!(message, "HTTP 502");
                assert!(code.is_none());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn refresh_config_delay_exponential_backoff() {
        let config = RefreshConfig::default();

        assert_eq!(
            config.delay_for_attempt(0),
            std::time::Duration::from_millis(500)
        );
        assert_eq!(
            config.delay_for_attempt(1),
            std::time::Duration::from_millis(1000)
        );
        assert_eq!(
            config.delay_for_attempt(2),
            std::time::Duration::from_millis(2000)
        );
        // Capped at the maximum delay.
        assert_eq!(
            config.delay_for_attempt(5),
            std::time::Duration::from_millis(5000)
        );
    }
}
