//! Persisted records - the durable outcome of a completed dialogue.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::dialogue::{Conversation, DialogueDefinition};
use crate::domain::foundation::{ChatId, RecordId, Timestamp, UserId};
use crate::domain::validation::FieldValue;

/// A committed record. Written once and never linked back to the
/// conversation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: RecordId,
    pub dialogue: String,
    pub chat_id: ChatId,
    pub submitted_by: UserId,
    pub fields: BTreeMap<String, FieldValue>,
    pub created_at: Timestamp,
}

impl PersistedRecord {
    /// Builds the record for a completed conversation, under the id the
    /// conversation was assigned on completion.
    pub fn from_conversation(conversation: &Conversation, now: Timestamp) -> Self {
        let key = conversation.key();
        Self {
            id: conversation.record_id().unwrap_or_default(),
            dialogue: conversation.dialogue().to_string(),
            chat_id: key.chat_id,
            submitted_by: key.user_id,
            fields: conversation.collected_fields().clone(),
            created_at: now,
        }
    }
}

/// A value that must not repeat among records of the same dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniqueValue {
    pub dialogue: String,
    pub field: String,
    /// Canonical form, so `+34 600` and `+34600` collide.
    pub value: String,
}

impl UniqueValue {
    /// Unique-field values present in `conversation`, per `definition`.
    ///
    /// Skipped optional fields carry no value and are not constrained.
    pub fn collect(definition: &DialogueDefinition, conversation: &Conversation) -> Vec<Self> {
        definition
            .unique_fields()
            .filter_map(|spec| {
                conversation.value(&spec.name).map(|value| UniqueValue {
                    dialogue: definition.name.clone(),
                    field: spec.name.clone(),
                    value: value.as_input().to_lowercase(),
                })
            })
            .collect()
    }

    /// User-facing explanation of a collision on this value.
    pub fn conflict_message(&self) -> String {
        format!("{} {} is already registered", self.field, self.value)
    }
}
