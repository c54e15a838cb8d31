//! In-memory persistence gateway.

use async_trait::async_trait;

use super::InMemoryDatabase;
use crate::domain::dialogue::{Conversation, DialogueDefinition, DialogueState};
use crate::domain::foundation::Timestamp;
use crate::domain::record::{PersistedRecord, UniqueValue};
use crate::ports::{PersistenceError, PersistenceGateway};

/// In-memory [`PersistenceGateway`].
///
/// Holds the shared write lock for the whole commit, so the record insert
/// and the conversation removal are observed together or not at all. A
/// record already stored under the conversation's id counts as committed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersistenceGateway {
    db: InMemoryDatabase,
}

impl InMemoryPersistenceGateway {
    pub fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryPersistenceGateway {
    async fn commit(
        &self,
        conversation: &Conversation,
        definition: &DialogueDefinition,
    ) -> Result<PersistedRecord, PersistenceError> {
        if conversation.state() != DialogueState::Completed {
            return Err(PersistenceError::Unexpected(format!(
                "conversation {} is {}, not completed",
                conversation.key(),
                conversation.state()
            )));
        }

        let record = PersistedRecord::from_conversation(conversation, Timestamp::now());
        let mut tables = self.db.tables().write().await;

        let existing = tables.records.iter().find(|r| r.id == record.id).cloned();
        if let Some(existing) = existing {
            tables.conversations.remove(&conversation.key());
            return Ok(existing);
        }

        let unique_values = UniqueValue::collect(definition, conversation);
        if let Some(taken) = unique_values
            .iter()
            .find(|value| tables.unique_values.contains(*value))
        {
            return Err(PersistenceError::Integrity(taken.conflict_message()));
        }

        tables.unique_values.extend(unique_values);
        tables.records.push(record.clone());
        tables.conversations.remove(&conversation.key());

        Ok(record)
    }
}
