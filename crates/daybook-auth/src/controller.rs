//! The auth controller: session lifecycle bridged into an observable
//! auth state store.

use crate::machine::{AuthPhase, SessionMachine, SessionMachineInput};
use crate::{AuthError, AuthResult};
use daybook_gateway::{AuthGateway, GatewayError, SessionChange};
use daybook_state::{StateStore, Subscription};
use daybook_types::User;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Message published when credentials are missing.
const MSG_MISSING_CREDENTIALS: &str = "Please enter your email and password.";
/// Generic messages for unexpected failures, per operation.
const MSG_SIGN_IN_FAILED: &str = "An error occurred during login.";
const MSG_SIGN_UP_FAILED: &str = "An error occurred during registration.";
const MSG_SIGN_OUT_FAILED: &str = "An error occurred during logout.";

/// Auth state broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// The signed-in user, if any.
    pub user: Option<User>,
    /// Whether an auth operation (or the startup restore) is in flight.
    pub loading: bool,
    /// Most recent failure message, if any.
    pub error: Option<String>,
}

impl Default for AuthSnapshot {
    /// Startup state: restoring the persisted session.
    fn default() -> Self {
        AuthSnapshot {
            user: None,
            loading: true,
            error: None,
        }
    }
}

/// Owns the session lifecycle against the backend gateway and
/// publishes `{user, loading, error}` transitions to subscribers.
///
/// Interactive sign-in/up never set `user` from their own return path:
/// the gateway's session-change notification is the only place `user`
/// flips, so a pending operation's completion cannot resurrect a stale
/// user that an intervening notification already superseded.
pub struct AuthController {
    gateway: Arc<dyn AuthGateway>,
    store: StateStore<AuthSnapshot>,
    machine: Mutex<SessionMachine>,
    initialized: AtomicBool,
}

impl AuthController {
    /// Create a controller in the `Initializing` phase.
    ///
    /// Call [`initialize`](AuthController::initialize) afterwards to
    /// restore the persisted session and start listening for
    /// gateway-pushed session changes.
    pub fn new(gateway: Arc<dyn AuthGateway>) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            store: StateStore::new(AuthSnapshot::default()),
            machine: Mutex::new(SessionMachine::new()),
            initialized: AtomicBool::new(false),
        })
    }

    /// Subscribe to auth state changes; the listener is invoked
    /// immediately with the current state.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthSnapshot) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Current auth state snapshot.
    pub fn state(&self) -> AuthSnapshot {
        self.store.get()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> AuthPhase {
        let machine = self.machine.lock().unwrap();
        AuthPhase::from(machine.state())
    }

    /// Restore the persisted session and start consuming gateway
    /// session-change notifications.
    ///
    /// A gateway failure here leaves the controller anonymous with the
    /// failure message in the state; it is not returned. Repeated calls
    /// are no-ops.
    pub async fn initialize(self: &Arc<Self>) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }

        match self.gateway.current_session().await {
            Ok(Some(session)) => {
                info!(user_id = %session.user.id, "Restored existing session");
                let _ = self.transition(&SessionMachineInput::SessionOpened);
                self.store.replace(AuthSnapshot {
                    user: Some(session.user),
                    loading: false,
                    error: None,
                });
            }
            Ok(None) => {
                info!("No existing session");
                let _ = self.transition(&SessionMachineInput::SessionMissing);
                self.store.replace(AuthSnapshot {
                    user: None,
                    loading: false,
                    error: None,
                });
            }
            Err(e) => {
                warn!(error = %e, "Session restore failed");
                let _ = self.transition(&SessionMachineInput::SessionMissing);
                self.store.replace(AuthSnapshot {
                    user: None,
                    loading: false,
                    error: Some(e.to_string()),
                });
            }
        }

        self.spawn_session_listener();
    }

    /// Consume gateway session-change notifications for the lifetime of
    /// the controller. The task holds only a weak reference, so it ends
    /// when the controller is dropped or the gateway closes the channel.
    fn spawn_session_listener(self: &Arc<Self>) {
        let mut rx = self.gateway.on_session_change();
        let weak: Weak<AuthController> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => match weak.upgrade() {
                        Some(controller) => controller.apply_session_change(change),
                        None => break,
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session-change listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    /// Apply one gateway-pushed session change. This is the only path
    /// that flips `user` after interactive auth operations.
    pub fn apply_session_change(&self, change: SessionChange) {
        debug!(event = ?change.event, "Session change");

        match change.session {
            Some(session) => {
                let _ = self.transition(&SessionMachineInput::SessionOpened);
                self.store.replace(AuthSnapshot {
                    user: Some(session.user),
                    loading: false,
                    error: None,
                });
            }
            None => {
                let _ = self.transition(&SessionMachineInput::SessionMissing);
                self.store.replace(AuthSnapshot {
                    user: None,
                    loading: false,
                    error: None,
                });
            }
        }
    }

    /// Credential sign-in.
    ///
    /// Returns the signed-in user on success; the state store's `user`
    /// is set by the subsequent session-change notification.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<User> {
        let email = email.trim();
        let password = password.trim();

        if email.is_empty() || password.is_empty() {
            self.store.update(|s| {
                s.loading = false;
                s.error = Some(MSG_MISSING_CREDENTIALS.to_string());
            });
            return Err(AuthError::Validation(MSG_MISSING_CREDENTIALS.to_string()));
        }

        self.transition(&SessionMachineInput::SignInStarted)?;
        self.store.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = self.gateway.sign_in_with_password(email, password).await;
        self.settle("sign-in", result, MSG_SIGN_IN_FAILED)
    }

    /// Credential registration. Same contract as sign-in.
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<User> {
        let email = email.trim();
        let password = password.trim();

        if email.is_empty() || password.is_empty() {
            self.store.update(|s| {
                s.loading = false;
                s.error = Some(MSG_MISSING_CREDENTIALS.to_string());
            });
            return Err(AuthError::Validation(MSG_MISSING_CREDENTIALS.to_string()));
        }

        self.transition(&SessionMachineInput::SignUpStarted)?;
        self.store.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = self.gateway.sign_up(email, password).await;
        self.settle("sign-up", result, MSG_SIGN_UP_FAILED)
    }

    /// End the active session.
    pub async fn sign_out(&self) -> AuthResult<()> {
        self.transition(&SessionMachineInput::SignOutStarted)?;
        self.store.update(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.gateway.sign_out().await {
            Ok(()) => {
                let _ = self.transition(&SessionMachineInput::SessionMissing);
                self.store.replace(AuthSnapshot {
                    user: None,
                    loading: false,
                    error: None,
                });
                info!("Sign-out complete");
                Ok(())
            }
            Err(e) if e.is_api_error() => {
                let _ = self.transition(&SessionMachineInput::Settled);
                let failure = gateway_failure(e);
                self.store.update(|s| {
                    s.loading = false;
                    s.error = Some(failure.to_string());
                });
                Err(failure)
            }
            Err(e) => {
                warn!(error = %e, "Unexpected failure during sign-out");
                let _ = self.transition(&SessionMachineInput::Settled);
                self.store.update(|s| {
                    s.loading = false;
                    s.error = Some(MSG_SIGN_OUT_FAILED.to_string());
                });
                Err(AuthError::Unexpected(MSG_SIGN_OUT_FAILED.to_string()))
            }
        }
    }

    /// Common completion handling for sign-in/up: publish the terminal
    /// state and map the gateway outcome, leaving `user` to the
    /// session-change path.
    fn settle(
        &self,
        operation: &str,
        result: Result<User, GatewayError>,
        generic_message: &str,
    ) -> AuthResult<User> {
        let _ = self.transition(&SessionMachineInput::Settled);

        match result {
            Ok(user) => {
                info!(user_id = %user.id, "{} accepted by gateway", operation);
                self.store.update(|s| {
                    s.loading = false;
                    s.error = None;
                });
                Ok(user)
            }
            Err(e) if e.is_api_error() => {
                let failure = gateway_failure(e);
                self.store.update(|s| {
                    s.loading = false;
                    s.error = Some(failure.to_string());
                });
                Err(failure)
            }
            Err(e) => {
                warn!(error = %e, "Unexpected failure during {}", operation);
                self.store.update(|s| {
                    s.loading = false;
                    s.error = Some(generic_message.to_string());
                });
                Err(AuthError::Unexpected(generic_message.to_string()))
            }
        }
    }

    /// Transition the session machine, mapping a rejected input to an
    /// auth error before any state is published.
    fn transition(&self, input: &SessionMachineInput) -> AuthResult<AuthPhase> {
        let mut machine = self.machine.lock().unwrap();
        let old_phase = AuthPhase::from(machine.state());

        machine.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                machine.state()
            ))
        })?;

        let new_phase = AuthPhase::from(machine.state());
        drop(machine);

        if old_phase != new_phase {
            debug!(?old_phase, ?new_phase, "Auth phase transition");
        }

        Ok(new_phase)
    }
}

/// Map a backend-reported failure into the auth error carrying its
/// message and code.
fn gateway_failure(error: GatewayError) -> AuthError {
    match error {
        GatewayError::Api { message, code, .. } => AuthError::Gateway { message, code },
        other => AuthError::Gateway {
            message: other.to_string(),
            code: None,
        },
    }
}
