//! Conversation loop around the matching pipeline.
//!
//! A [`Conversation`] owns one session's message log and runs at most one
//! turn at a time. [`SessionRegistry`] keeps the live conversations.

pub mod conversation;
pub mod session;
pub mod types;

pub use conversation::{Conversation, ReplyFuture, Responder, APOLOGY_MESSAGE};
pub use session::SessionRegistry;
pub use types::*;
