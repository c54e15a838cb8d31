//! Persistence gateway port.
//!
//! Turns a completed conversation into a record. Inserting the record,
//! checking unique fields and clearing the conversation happen as one unit:
//! either all of it applies or none of it does.

use async_trait::async_trait;

use crate::domain::dialogue::{Conversation, DialogueDefinition};
use crate::domain::foundation::{Classify, ErrorClass};
use crate::domain::record::PersistedRecord;

/// Errors raised while committing a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// A unique field's value is already taken. The message is shown to the user.
    #[error("{0}")]
    Integrity(String),

    /// The store could not be reached; worth retrying.
    #[error("Persistence connection error: {0}")]
    Connection(String),

    #[error("Unexpected persistence error: {0}")]
    Unexpected(String),
}

impl Classify for PersistenceError {
    fn class(&self) -> ErrorClass {
        match self {
            PersistenceError::Connection(_) => ErrorClass::Transient,
            PersistenceError::Integrity(_) | PersistenceError::Unexpected(_) => {
                ErrorClass::Permanent
            }
        }
    }
}

/// Port for the atomic "insert record + clear conversation" unit.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Commits `conversation`, which must be `Completed`.
    ///
    /// `definition` supplies the unique fields to enforce. The record is
    /// written under `conversation.record_id()`; when that record already
    /// exists the call clears the conversation and returns the stored record,
    /// so retrying after a lost reply is safe.
    ///
    /// # Errors
    ///
    /// - `Integrity` when a unique value already exists; nothing is written
    /// - `Connection` on transient failures; nothing is written
    async fn commit(
        &self,
        conversation: &Conversation,
        definition: &DialogueDefinition,
    ) -> Result<PersistedRecord, PersistenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PersistenceGateway) {}
    }

    #[test]
    fn integrity_message_is_shown_verbatim() {
        let err = PersistenceError::Integrity("phone +34600 is already registered".into());
        assert_eq!(err.to_string(), "phone +34600 is already registered");
        assert!(!err.class().is_transient());
    }

    #[test]
    fn connection_errors_are_transient() {
        assert!(PersistenceError::Connection("timeout".into()).class().is_transient());
    }
}
