//! Authentication for the Daybook client core.
//!
//! This crate provides:
//! - An explicit finite state machine for the session lifecycle
//! - The [`AuthController`]: session lifecycle bridged into an
//!   observable auth state store
//!
//! The controller never sets the signed-in user from an interactive
//! operation's return path; the gateway's session-change notifications
//! are the single source of truth for "who is logged in".

mod controller;
mod error;
mod machine;

pub use controller::{AuthController, AuthSnapshot};
pub use error::{AuthError, AuthResult};
pub use machine::session_machine;
pub use machine::{AuthPhase, SessionMachine, SessionMachineInput, SessionMachineState};
