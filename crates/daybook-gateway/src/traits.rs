//! The gateway contract consumed by the Auth Controller.

use crate::{GatewayResult, Session, SessionChange};
use async_trait::async_trait;
use daybook_types::User;
use tokio::sync::broadcast;

/// Authentication surface of the hosted backend.
///
/// All calls are asynchronous and may fail with a [`GatewayError`]
/// carrying a human-readable message. Session-change notifications are
/// pushed over the broadcast channel returned by [`on_session_change`];
/// the gateway fires them itself after interactive auth operations and
/// background refreshes, so subscribers have one source of truth for
/// "who is logged in".
///
/// [`GatewayError`]: crate::GatewayError
/// [`on_session_change`]: AuthGateway::on_session_change
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// The currently active session, restoring and refreshing a
    /// persisted one if necessary. `None` when signed out.
    async fn current_session(&self) -> GatewayResult<Option<Session>>;

    /// Credential sign-in. Returns the signed-in user; the session
    /// itself arrives through the session-change channel.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<User>;

    /// Credential registration, same contract as sign-in.
    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<User>;

    /// End the active session.
    async fn sign_out(&self) -> GatewayResult<()>;

    /// Subscribe to push-style session-change notifications.
    fn on_session_change(&self) -> broadcast::Receiver<SessionChange>;
}
