//! Arquea - conversational command processor for a chat bot.
//!
//! Users fill in multi-step forms ("dialogues") one chat message at a time.
//! Every answer is validated, progress survives restarts, and a completed
//! dialogue is committed as a record in one transaction.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
