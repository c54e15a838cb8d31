//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, pagination)
//! - `validation` - Field rules that check and coerce raw user input
//! - `dialogue` - Dialogue definitions, conversation progress and the engine
//! - `record` - Records produced by completed dialogues
//! - `bot_user` - Users registered with the bot and their roles

pub mod bot_user;
pub mod dialogue;
pub mod foundation;
pub mod record;
pub mod validation;
