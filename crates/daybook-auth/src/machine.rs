//! Session lifecycle state machine using rust-fsm.
//!
//! The machine makes the session lifecycle explicit instead of deriving
//! it from whatever the state store happens to contain, and it is what
//! rejects a second interactive auth operation while one is pending.
//!
//! ## State Diagram
//!
//! ```text
//! ┌──────────────────┐
//! │   Initializing   │ (initial; restoring a persisted session)
//! └────────┬─────────┘
//!          │ SessionOpened / SessionMissing
//!          ▼
//! ┌──────────────────┐  SignInStarted / SignUpStarted  ┌─────────────────────────┐
//! │    Anonymous     │ ───────────────────────────────►│  SigningIn / SigningUp  │
//! └────────┬─────────┘◄─────────────────────────────── └───────────┬─────────────┘
//!          │                  Settled                              │
//!          │ SessionOpened                                         │ SessionOpened
//!          ▼                                                       ▼
//! ┌──────────────────┐         SignOutStarted          ┌─────────────────────────┐
//! │  Authenticated   │ ───────────────────────────────►│       SigningOut        │
//! └──────────────────┘◄─────────────────────────────── └───────────┬─────────────┘
//!                                Settled (failed)                  │ SessionMissing
//!                                                                  ▼
//!                                                              Anonymous
//! ```
//!
//! `SessionOpened`/`SessionMissing` are gateway-pushed events and are
//! legal in every state: externally driven expiry or a sign-out on
//! another device overrides whatever preceded it.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

// Define the FSM using rust-fsm's declarative macro.
// This generates a module `session_machine` with:
// - session_machine::State (enum)
// - session_machine::Input (enum)
// - session_machine::StateMachine (type alias)
// - session_machine::Impl (trait impl)
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Initializing)

    Initializing => {
        SessionOpened => Authenticated,
        SessionMissing => Anonymous
    },
    Anonymous => {
        SignInStarted => SigningIn,
        SignUpStarted => SigningUp,
        SessionOpened => Authenticated,
        SessionMissing => Anonymous
    },
    SigningIn => {
        Settled => Anonymous,
        SessionOpened => Authenticated,
        SessionMissing => Anonymous
    },
    SigningUp => {
        Settled => Anonymous,
        SessionOpened => Authenticated,
        SessionMissing => Anonymous
    },
    Authenticated => {
        SignOutStarted => SigningOut,
        Settled => Authenticated,
        SessionOpened => Authenticated,
        SessionMissing => Anonymous
    },
    SigningOut => {
        Settled => Authenticated,
        SessionOpened => Authenticated,
        SessionMissing => Anonymous
    }
}

// Re-export the generated types with clearer names
pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// User-facing view of the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    /// Restoring a persisted session on startup.
    Initializing,
    /// No active session.
    Anonymous,
    /// Signed in with an active session.
    Authenticated,
    /// Credential sign-in in flight.
    SigningIn,
    /// Registration in flight.
    SigningUp,
    /// Sign-out in flight.
    SigningOut,
}

impl AuthPhase {
    /// Returns true when a session is active.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthPhase::Authenticated)
    }

    /// Returns true while an interactive operation (or startup restore)
    /// is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            AuthPhase::Initializing
                | AuthPhase::SigningIn
                | AuthPhase::SigningUp
                | AuthPhase::SigningOut
        )
    }
}

impl From<&SessionMachineState> for AuthPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Initializing => AuthPhase::Initializing,
            SessionMachineState::Anonymous => AuthPhase::Anonymous,
            SessionMachineState::Authenticated => AuthPhase::Authenticated,
            SessionMachineState::SigningIn => AuthPhase::SigningIn,
            SessionMachineState::SigningUp => AuthPhase::SigningUp,
            SessionMachineState::SigningOut => AuthPhase::SigningOut,
        }
    }
}
