//! Conversation store port.
//!
//! Durable per-(chat, user) dialogue progress. There is at most one active
//! conversation per key; `save` overwrites whatever was stored before.

use async_trait::async_trait;

use crate::domain::dialogue::Conversation;
use crate::domain::foundation::{Classify, ConversationKey, ErrorClass, Timestamp};

/// Errors raised by conversation, user and record storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached; worth retrying.
    #[error("Storage connection error: {0}")]
    Connection(String),

    #[error("Failed to (de)serialize stored data: {0}")]
    Serialization(String),

    #[error("Unexpected storage error: {0}")]
    Unexpected(String),
}

impl Classify for StoreError {
    fn class(&self) -> ErrorClass {
        match self {
            StoreError::Connection(_) => ErrorClass::Transient,
            StoreError::Serialization(_) | StoreError::Unexpected(_) => ErrorClass::Permanent,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Port for persisting in-progress conversations.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Loads the active conversation for `key`, if any.
    async fn load(&self, key: ConversationKey) -> Result<Option<Conversation>, StoreError>;

    /// Upserts the whole conversation, collected fields included.
    ///
    /// Last writer wins; callers serialize writers per key.
    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Removes the conversation for `key`. Clearing a missing key is not an error.
    async fn clear(&self, key: ConversationKey) -> Result<(), StoreError>;

    /// Removes every conversation last updated before `older_than`.
    ///
    /// # Returns
    /// The number of conversations removed.
    async fn expire_stale(&self, older_than: Timestamp) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn ConversationStore) {}
    }

    #[test]
    fn only_connection_errors_are_transient() {
        assert!(StoreError::Connection("reset".into()).class().is_transient());
        assert!(!StoreError::Serialization("bad json".into()).class().is_transient());
        assert!(!StoreError::Unexpected("boom".into()).class().is_transient());
    }

    #[test]
    fn json_errors_become_serialization_errors() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Serialization(_)));
    }
}
