//! PostgreSQL implementation of ConversationStore.
//!
//! One row per (chat_id, user_id). State and collected fields are JSONB so
//! a reloaded conversation carries exactly the typed values it was saved
//! with.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::errors::store_error;
use crate::domain::dialogue::{Conversation, DialogueState};
use crate::domain::foundation::{ConversationKey, RecordId, Timestamp};
use crate::domain::validation::FieldValue;
use crate::ports::{ConversationStore, StoreError};

/// PostgreSQL implementation of ConversationStore.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    /// Creates a new PostgresConversationStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn load(&self, key: ConversationKey) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT dialogue, current_state, collected_fields, created_at, updated_at, record_id
            FROM conversations
            WHERE chat_id = $1 AND user_id = $2
            "#,
        )
        .bind(key.chat_id.as_i64())
        .bind(key.user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("Failed to fetch conversation", e))?;

        row.map(|row| row_to_conversation(key, &row)).transpose()
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let key = conversation.key();
        let state = serde_json::to_value(conversation.state())?;
        let fields = serde_json::to_value(conversation.collected_fields())?;

        sqlx::query(
            r#"
            INSERT INTO conversations (
                chat_id, user_id, dialogue, current_state, collected_fields,
                created_at, updated_at, record_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (chat_id, user_id) DO UPDATE SET
                dialogue = EXCLUDED.dialogue,
                current_state = EXCLUDED.current_state,
                collected_fields = EXCLUDED.collected_fields,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                record_id = EXCLUDED.record_id
            "#,
        )
        .bind(key.chat_id.as_i64())
        .bind(key.user_id.as_i64())
        .bind(conversation.dialogue())
        .bind(state)
        .bind(fields)
        .bind(conversation.created_at().as_datetime())
        .bind(conversation.updated_at().as_datetime())
        .bind(conversation.record_id().map(|id| *id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("Failed to save conversation", e))?;

        Ok(())
    }

    async fn clear(&self, key: ConversationKey) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM conversations WHERE chat_id = $1 AND user_id = $2")
            .bind(key.chat_id.as_i64())
            .bind(key.user_id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Failed to clear conversation", e))?;
        Ok(())
    }

    async fn expire_stale(&self, older_than: Timestamp) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM conversations WHERE updated_at < $1")
            .bind(older_than.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("Failed to expire conversations", e))?;
        Ok(result.rows_affected())
    }
}

fn row_to_conversation(key: ConversationKey, row: &PgRow) -> Result<Conversation, StoreError> {
    let column = |e: sqlx::Error| store_error("Failed to read conversation row", e);

    let dialogue: String = row.try_get("dialogue").map_err(column)?;
    let state: serde_json::Value = row.try_get("current_state").map_err(column)?;
    let fields: serde_json::Value = row.try_get("collected_fields").map_err(column)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(column)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(column)?;
    let record_id: Option<Uuid> = row.try_get("record_id").map_err(column)?;

    Ok(Conversation::reconstitute(
        key,
        dialogue,
        parse_state(state)?,
        parse_fields(fields)?,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
        record_id.map(RecordId::from_uuid),
    ))
}

fn parse_state(value: serde_json::Value) -> Result<DialogueState, StoreError> {
    Ok(serde_json::from_value(value)?)
}

fn parse_fields(value: serde_json::Value) -> Result<BTreeMap<String, FieldValue>, StoreError> {
    Ok(serde_json::from_value(value)?)
}
