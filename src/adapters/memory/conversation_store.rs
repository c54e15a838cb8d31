//! In-memory conversation store.

use async_trait::async_trait;

use super::InMemoryDatabase;
use crate::domain::dialogue::Conversation;
use crate::domain::foundation::{ConversationKey, Timestamp};
use crate::ports::{ConversationStore, StoreError};

/// In-memory [`ConversationStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    db: InMemoryDatabase,
}

impl InMemoryConversationStore {
    pub fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, key: ConversationKey) -> Result<Option<Conversation>, StoreError> {
        let tables = self.db.tables().read().await;
        Ok(tables.conversations.get(&key).cloned())
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut tables = self.db.tables().write().await;
        tables
            .conversations
            .insert(conversation.key(), conversation.clone());
        Ok(())
    }

    async fn clear(&self, key: ConversationKey) -> Result<(), StoreError> {
        self.db.tables().write().await.conversations.remove(&key);
        Ok(())
    }

    async fn expire_stale(&self, older_than: Timestamp) -> Result<u64, StoreError> {
        let mut tables = self.db.tables().write().await;
        let before = tables.conversations.len();
        tables
            .conversations
            .retain(|_, c| !c.updated_at().is_before(&older_than));
        Ok((before - tables.conversations.len()) as u64)
    }
}
