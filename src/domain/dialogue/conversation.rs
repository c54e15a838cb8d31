//! Conversation aggregate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use super::DialogueState;
use crate::domain::foundation::{ConversationKey, RecordId, Timestamp};
use crate::domain::validation::FieldValue;

/// Raised when a conversation is asked to make an illegal state move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: DialogueState,
    pub to: DialogueState,
}

/// Progress of one user through one dialogue in one chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    key: ConversationKey,
    dialogue: String,
    state: DialogueState,
    collected_fields: BTreeMap<String, FieldValue>,
    created_at: Timestamp,
    updated_at: Timestamp,
    /// Id of the record this conversation commits to. Assigned on first
    /// completion and kept, so a repeated commit writes the same record.
    #[serde(default)]
    record_id: Option<RecordId>,
}

impl Conversation {
    /// Starts a fresh conversation at the first field.
    pub fn start(key: ConversationKey, dialogue: impl Into<String>, now: Timestamp) -> Self {
        Self {
            key,
            dialogue: dialogue.into(),
            state: DialogueState::initial(),
            collected_fields: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            record_id: None,
        }
    }

    /// Rebuilds a conversation from storage.
    pub fn reconstitute(
        key: ConversationKey,
        dialogue: String,
        state: DialogueState,
        collected_fields: BTreeMap<String, FieldValue>,
        created_at: Timestamp,
        updated_at: Timestamp,
        record_id: Option<RecordId>,
    ) -> Self {
        Self {
            key,
            dialogue,
            state,
            collected_fields,
            created_at,
            updated_at,
            record_id,
        }
    }

    pub fn key(&self) -> ConversationKey {
        self.key
    }

    pub fn dialogue(&self) -> &str {
        &self.dialogue
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn collected_fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.collected_fields
    }

    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.collected_fields.get(field)
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// True when the conversation has been idle for longer than `threshold`.
    pub fn is_stale(&self, now: Timestamp, threshold: Duration) -> bool {
        self.updated_at.is_before(&now.minus(threshold))
    }

    pub fn set_value(&mut self, field: impl Into<String>, value: FieldValue, now: Timestamp) {
        self.collected_fields.insert(field.into(), value);
        self.updated_at = now;
    }

    pub fn remove_value(&mut self, field: &str, now: Timestamp) {
        self.collected_fields.remove(field);
        self.updated_at = now;
    }

    /// Moves to `target` if legal for a dialogue of `field_count` fields.
    pub fn transition_to(
        &mut self,
        target: DialogueState,
        field_count: usize,
        now: Timestamp,
    ) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(&target, field_count) {
            return Err(InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        if target == DialogueState::Completed && self.record_id.is_none() {
            self.record_id = Some(RecordId::new());
        }
        self.state = target;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ChatId, UserId};

    fn key() -> ConversationKey {
        ConversationKey::new(ChatId::new(1), UserId::new(2))
    }

    #[test]
    fn starts_empty_at_first_field() {
        let conversation = Conversation::start(key(), "person", Timestamp::now());
        assert_eq!(conversation.state(), DialogueState::AwaitingField { index: 0 });
        assert!(conversation.collected_fields().is_empty());
        assert_eq!(conversation.created_at(), conversation.updated_at());
    }

    #[test]
    fn set_value_touches_updated_at() {
        let start = Timestamp::from_unix_secs(1_000);
        let later = Timestamp::from_unix_secs(2_000);
        let mut conversation = Conversation::start(key(), "person", start);

        conversation.set_value("name", FieldValue::from("Alice"), later);

        assert_eq!(conversation.value("name"), Some(&FieldValue::from("Alice")));
        assert_eq!(conversation.updated_at(), later);
        assert_eq!(conversation.created_at(), start);
    }

    #[test]
    fn rejects_illegal_transition() {
        let mut conversation = Conversation::start(key(), "person", Timestamp::now());
        let err = conversation
            .transition_to(DialogueState::Completed, 2, Timestamp::now())
            .unwrap_err();
        assert_eq!(err.from, DialogueState::AwaitingField { index: 0 });
        assert_eq!(conversation.state(), DialogueState::AwaitingField { index: 0 });
    }

    #[test]
    fn applies_legal_transition() {
        let mut conversation = Conversation::start(key(), "person", Timestamp::now());
        conversation
            .transition_to(DialogueState::AwaitingField { index: 1 }, 2, Timestamp::now())
            .unwrap();
        assert_eq!(conversation.state(), DialogueState::AwaitingField { index: 1 });
    }

    #[test]
    fn completion_assigns_a_record_id_once() {
        let mut conversation = Conversation::start(key(), "person", Timestamp::now());
        assert_eq!(conversation.record_id(), None);

        conversation
            .transition_to(DialogueState::Completed, 1, Timestamp::now())
            .unwrap();
        let assigned = conversation.record_id().unwrap();

        conversation
            .transition_to(
                DialogueState::Revising {
                    index: 0,
                    resume_at: None,
                },
                1,
                Timestamp::now(),
            )
            .unwrap();
        conversation
            .transition_to(DialogueState::Completed, 1, Timestamp::now())
            .unwrap();
        assert_eq!(conversation.record_id(), Some(assigned));
    }

    #[test]
    fn staleness_uses_updated_at() {
        let conversation = Conversation::start(key(), "person", Timestamp::from_unix_secs(0));
        let threshold = Duration::from_secs(60);

        assert!(!conversation.is_stale(Timestamp::from_unix_secs(30), threshold));
        assert!(conversation.is_stale(Timestamp::from_unix_secs(61), threshold));
    }

    #[test]
    fn round_trips_through_json() {
        let mut conversation = Conversation::start(key(), "person", Timestamp::from_unix_secs(5));
        conversation.set_value("age", FieldValue::Integer(30), Timestamp::from_unix_secs(6));

        let json = serde_json::to_string(&conversation).unwrap();
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conversation);
    }
}
