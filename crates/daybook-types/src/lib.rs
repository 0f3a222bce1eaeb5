//! Shared data model for the Daybook client core.
//!
//! This crate provides:
//! - User and profile records mirrored from the backend
//! - Diary post and public feed records
//! - The closed application error taxonomy with stable codes
//! - Input validation helpers shared by sign-up and post forms

mod error;
mod posts;
mod user;
pub mod validation;

pub use error::{AppError, AppResult};
pub use posts::{FeedSort, NewPersonalPost, PersonalPost, PersonalPostUpdate, PostLike, SharedPost};
pub use user::{User, UserProfile};
