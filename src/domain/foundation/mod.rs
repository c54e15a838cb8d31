//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and error types that form the
//! vocabulary of the Arquea domain.

mod errors;
mod ids;
mod pagination;
mod timestamp;

pub use errors::{Classify, ErrorClass, ValidationError};
pub use ids::{ChatId, ConversationKey, RecordId, UserId};
pub use pagination::{Page, Pagination};
pub use timestamp::Timestamp;
