//! In-memory adapters.
//!
//! All adapters built from one [`InMemoryDatabase`] share a single lock, so
//! a gateway commit (insert record + clear conversation) is atomic with
//! respect to the conversation store. Useful for testing and development.

mod conversation_store;
mod persistence_gateway;
mod record_reader;
mod user_directory;

pub use conversation_store::InMemoryConversationStore;
pub use persistence_gateway::InMemoryPersistenceGateway;
pub use record_reader::InMemoryRecordReader;
pub use user_directory::InMemoryUserDirectory;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::bot_user::BotUser;
use crate::domain::dialogue::Conversation;
use crate::domain::foundation::{ConversationKey, UserId};
use crate::domain::record::{PersistedRecord, UniqueValue};

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub conversations: HashMap<ConversationKey, Conversation>,
    /// In insertion order.
    pub records: Vec<PersistedRecord>,
    pub unique_values: HashSet<UniqueValue>,
    pub users: HashMap<UserId, BotUser>,
}

/// Shared in-memory backing store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation_store(&self) -> InMemoryConversationStore {
        InMemoryConversationStore::new(self.clone())
    }

    pub fn persistence_gateway(&self) -> InMemoryPersistenceGateway {
        InMemoryPersistenceGateway::new(self.clone())
    }

    pub fn record_reader(&self) -> InMemoryRecordReader {
        InMemoryRecordReader::new(self.clone())
    }

    pub fn user_directory(&self, admins: HashSet<UserId>) -> InMemoryUserDirectory {
        InMemoryUserDirectory::new(self.clone(), admins)
    }

    /// Get the number of active conversations
    pub async fn conversation_count(&self) -> usize {
        self.tables.read().await.conversations.len()
    }

    /// Get the number of committed records
    pub async fn record_count(&self) -> usize {
        self.tables.read().await.records.len()
    }

    /// Clear all stored data (useful for tests)
    pub async fn reset(&self) {
        *self.tables.write().await = Tables::default();
    }

    pub(crate) fn tables(&self) -> &RwLock<Tables> {
        &self.tables
    }
}
