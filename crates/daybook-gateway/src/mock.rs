//! Scripted gateway double for tests.

use crate::{AuthGateway, GatewayResult, Session, SessionChange};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use daybook_types::User;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Build a user for tests.
pub fn test_user(email: &str) -> User {
    User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        created_at: Utc::now(),
        updated_at: None,
        email_confirmed_at: None,
        last_sign_in_at: Some(Utc::now()),
    }
}

/// Build a one-hour session for tests.
pub fn test_session(user: User) -> Session {
    Session {
        user,
        access_token: "test-access-token".to_string(),
        refresh_token: "test-refresh-token".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

#[derive(Default)]
struct Script {
    current_session_errors: VecDeque<crate::GatewayError>,
    sign_in_results: VecDeque<GatewayResult<User>>,
    sign_up_results: VecDeque<GatewayResult<User>>,
    sign_out_results: VecDeque<GatewayResult<()>>,
}

/// A gateway double that records calls and replays scripted results.
///
/// Unlike the real gateway it never fires session-change events on its
/// own; tests drive the push channel explicitly through [`emit`] so
/// event ordering stays deterministic.
///
/// [`emit`]: MockAuthGateway::emit
pub struct MockAuthGateway {
    current_session: Mutex<Option<Session>>,
    script: Mutex<Script>,
    sign_in_calls: Mutex<Vec<(String, String)>>,
    sign_up_calls: Mutex<Vec<(String, String)>>,
    sign_out_calls: AtomicUsize,
    events: broadcast::Sender<SessionChange>,
}

impl MockAuthGateway {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            current_session: Mutex::new(None),
            script: Mutex::new(Script::default()),
            sign_in_calls: Mutex::new(Vec::new()),
            sign_up_calls: Mutex::new(Vec::new()),
            sign_out_calls: AtomicUsize::new(0),
            events,
        }
    }

    /// Start with an active session, as after a restored sign-in.
    pub fn with_session(session: Session) -> Self {
        let gateway = Self::new();
        *gateway.current_session.lock().unwrap() = Some(session);
        gateway
    }

    /// Replace the session `current_session` answers with.
    pub fn set_current_session(&self, session: Option<Session>) {
        *self.current_session.lock().unwrap() = session;
    }

    /// Fail the next `current_session` call with `error`.
    pub fn fail_next_current_session(&self, error: crate::GatewayError) {
        self.script
            .lock()
            .unwrap()
            .current_session_errors
            .push_back(error);
    }

    /// Script the next sign-in result. Unscripted calls succeed with a
    /// user derived from the submitted email.
    pub fn queue_sign_in(&self, result: GatewayResult<User>) {
        self.script.lock().unwrap().sign_in_results.push_back(result);
    }

    /// Script the next sign-up result.
    pub fn queue_sign_up(&self, result: GatewayResult<User>) {
        self.script.lock().unwrap().sign_up_results.push_back(result);
    }

    /// Script the next sign-out result. Unscripted calls succeed.
    pub fn queue_sign_out(&self, result: GatewayResult<()>) {
        self.script.lock().unwrap().sign_out_results.push_back(result);
    }

    /// Push a session-change notification to subscribers.
    pub fn emit(&self, change: SessionChange) {
        if let Some(session) = &change.session {
            *self.current_session.lock().unwrap() = Some(session.clone());
        } else {
            *self.current_session.lock().unwrap() = None;
        }
        let _ = self.events.send(change);
    }

    /// Credentials each sign-in call was made with.
    pub fn sign_in_calls(&self) -> Vec<(String, String)> {
        self.sign_in_calls.lock().unwrap().clone()
    }

    /// Credentials each sign-up call was made with.
    pub fn sign_up_calls(&self) -> Vec<(String, String)> {
        self.sign_up_calls.lock().unwrap().clone()
    }

    /// How many times sign-out was called.
    pub fn sign_out_call_count(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAuthGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthGateway for MockAuthGateway {
    async fn current_session(&self) -> GatewayResult<Option<Session>> {
        if let Some(error) = self
            .script
            .lock()
            .unwrap()
            .current_session_errors
            .pop_front()
        {
            return Err(error);
        }
        Ok(self.current_session.lock().unwrap().clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<User> {
        self.sign_in_calls
            .lock()
            .unwrap()
            .push((email.to_string(), password.to_string()));

        match self.script.lock().unwrap().sign_in_results.pop_front() {
            Some(result) => result,
            None => Ok(test_user(email)),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<User> {
        self.sign_up_calls
            .lock()
            .unwrap()
            .push((email.to_string(), password.to_string()));

        match self.script.lock().unwrap().sign_up_results.pop_front() {
            Some(result) => result,
            None => Ok(test_user(email)),
        }
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);

        match self.script.lock().unwrap().sign_out_results.pop_front() {
            Some(result) => result,
            None => Ok(()),
        }
    }

    fn on_session_change(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }
}
