//! Runtime wiring for the client core.

use daybook_auth::{AuthController, AuthError, AuthResult};
use daybook_config_and_utils::{Config, CoreError, CoreResult, Paths};
use daybook_feed::{DiaryService, FeedContext, FeedService, PostsApi, PostsClient};
use daybook_gateway::{AuthGateway, GatewayResult, SupabaseAuthGateway};
use daybook_state::{ErrorMiddleware, LoadingMiddleware};
use daybook_storage::{FileStore, SessionStore};
use daybook_types::validation::{is_valid_email, password_policy_errors};
use daybook_types::{AppError, User};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

const MSG_SIGNING_IN: &str = "Signing in...";
const MSG_SIGNING_UP: &str = "Signing up...";
const MSG_SIGNING_OUT: &str = "Signing out...";

/// Process-wide access point composing auth, loading, error, and the
/// data services.
pub struct AppRuntime {
    gateway: Arc<dyn AuthGateway>,
    auth: Arc<AuthController>,
    loading: LoadingMiddleware,
    errors: ErrorMiddleware,
    diary: DiaryService,
    feed: FeedService,
}

impl AppRuntime {
    /// Build the production runtime: file-persisted session, hosted
    /// gateway, REST data services.
    pub fn from_config(config: &Config, paths: &Paths) -> CoreResult<Self> {
        config.validate()?;

        let store = FileStore::open(paths.session_file())
            .map_err(|e| CoreError::Config(format!("session store: {}", e)))?;
        let sessions = SessionStore::new(Box::new(store));

        let gateway: Arc<dyn AuthGateway> = Arc::new(SupabaseAuthGateway::new(
            config.supabase_url.clone(),
            config.supabase_publishable_key.clone(),
            sessions,
        ));
        let posts: Arc<dyn PostsApi> = Arc::new(PostsClient::new(
            config.supabase_url.clone(),
            config.supabase_publishable_key.clone(),
        ));

        info!(app = %config.app_name, version = %config.app_version, "Client runtime assembled");
        Ok(Self::with_backends(gateway, posts))
    }

    /// Build a runtime over explicit backends. This is the seam tests
    /// and alternative deployments inject through.
    pub fn with_backends(gateway: Arc<dyn AuthGateway>, posts: Arc<dyn PostsApi>) -> Self {
        Self {
            auth: AuthController::new(gateway.clone()),
            gateway,
            loading: LoadingMiddleware::new(),
            errors: ErrorMiddleware::new(),
            diary: DiaryService::new(posts.clone()),
            feed: FeedService::new(posts),
        }
    }

    /// Restore the persisted session and start the session-change
    /// listener. Call once at startup.
    pub async fn init(&self) {
        self.auth.initialize().await;
    }

    /// The auth controller (subscribe, state, phase).
    pub fn auth(&self) -> &Arc<AuthController> {
        &self.auth
    }

    /// The shared loading middleware.
    pub fn loading(&self) -> &LoadingMiddleware {
        &self.loading
    }

    /// The shared error middleware.
    pub fn errors(&self) -> &ErrorMiddleware {
        &self.errors
    }

    /// The user's own diary posts.
    pub fn diary(&self) -> &DiaryService {
        &self.diary
    }

    /// The public feed.
    pub fn feed(&self) -> &FeedService {
        &self.feed
    }

    /// Sign in while the shared loading flag is raised.
    pub async fn sign_in_with_loading(&self, email: &str, password: &str) -> AuthResult<User> {
        self.loading
            .with_loading(Some(MSG_SIGNING_IN), self.auth.sign_in(email, password))
            .await
    }

    /// Register while the shared loading flag is raised.
    pub async fn sign_up_with_loading(&self, email: &str, password: &str) -> AuthResult<User> {
        self.loading
            .with_loading(Some(MSG_SIGNING_UP), self.auth.sign_up(email, password))
            .await
    }

    /// Sign out while the shared loading flag is raised.
    pub async fn sign_out_with_loading(&self) -> AuthResult<()> {
        self.loading
            .with_loading(Some(MSG_SIGNING_OUT), self.auth.sign_out())
            .await
    }

    /// Registration with full form validation: email shape, password
    /// policy, and confirmation match are checked before the gateway
    /// is involved.
    pub async fn sign_up_validated(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> AuthResult<User> {
        let email = email.trim();

        if !is_valid_email(email) {
            return Err(AuthError::Validation(
                "Please enter a valid email format.".to_string(),
            ));
        }

        let policy_errors = password_policy_errors(password);
        if let Some(first) = policy_errors.into_iter().next() {
            return Err(AuthError::Validation(first));
        }

        if password != confirm_password {
            return Err(AuthError::Validation("Passwords do not match.".to_string()));
        }

        self.sign_up_with_loading(email, password).await
    }

    /// Run an arbitrary operation under the shared error middleware:
    /// failures are normalized, broadcast, and swallowed into `None`.
    pub async fn execute_with_error_handling<T, F>(
        &self,
        context: Option<&str>,
        operation: F,
    ) -> Option<T>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        self.errors.with_error_handling(context, operation).await
    }

    /// Per-call data context for the diary/feed services, derived from
    /// the active session. `None` when signed out.
    pub async fn feed_context(&self) -> GatewayResult<Option<FeedContext>> {
        let session = self.gateway.current_session().await?;
        Ok(session.map(|s| FeedContext {
            user_id: s.user.id,
            access_token: s.access_token,
        }))
    }
}
