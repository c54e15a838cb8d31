//! Dialogue module - definitions, conversation progress and the engine.
//!
//! # Flow
//!
//! ```text
//! text ─classify─▶ Command ─advance(current)─▶ Transition { effect, replies }
//! ```
//!
//! A conversation only reaches `Completed` after every field of its
//! dialogue has been answered (or skipped, when optional) in order.

mod command;
mod conversation;
mod definition;
mod engine;
pub mod replies;
mod state;

pub use command::Command;
pub use conversation::{Conversation, InvalidTransition};
pub use definition::{CatalogError, DialogueCatalog, DialogueDefinition, RESERVED_COMMANDS};
pub use engine::{DialogueEngine, Effect, Transition};
pub use state::DialogueState;
