//! PostgreSQL implementation of PersistenceGateway.
//!
//! A commit runs in one transaction:
//! 1. insert the record, keyed by the conversation's record id
//! 2. claim each unique value in `record_unique_values`
//! 3. delete the conversation row
//!
//! A unique violation in step 2 rolls everything back. When step 1 finds
//! the record already present, an earlier attempt went through: the stored
//! row is returned and only step 3 runs.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::errors::persistence_error;
use super::record_reader::row_to_record;
use crate::domain::dialogue::{Conversation, DialogueDefinition, DialogueState};
use crate::domain::foundation::Timestamp;
use crate::domain::record::{PersistedRecord, UniqueValue};
use crate::ports::{PersistenceError, PersistenceGateway};

/// PostgreSQL implementation of PersistenceGateway.
#[derive(Clone)]
pub struct PostgresPersistenceGateway {
    pool: PgPool,
}

impl PostgresPersistenceGateway {
    /// Creates a new PostgresPersistenceGateway.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersistenceGateway for PostgresPersistenceGateway {
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
        let fields = serde_json::to_value(&record.fields)
            .map_err(|e| PersistenceError::Unexpected(format!("Failed to encode fields: {}", e)))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| persistence_error("Failed to start transaction", e))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO records (id, dialogue, chat_id, submitted_by, fields, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.dialogue)
        .bind(record.chat_id.as_i64())
        .bind(record.submitted_by.as_i64())
        .bind(fields)
        .bind(record.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| persistence_error("Failed to insert record", e))?
        .rows_affected();

        if inserted == 0 {
            let row = sqlx::query(
                r#"
                SELECT id, dialogue, chat_id, submitted_by, fields, created_at
                FROM records
                WHERE id = $1
                "#,
            )
            .bind(record.id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| persistence_error("Failed to fetch committed record", e))?;
            let existing = row_to_record(&row)
                .map_err(|e| PersistenceError::Unexpected(e.to_string()))?;

            debug!(record_id = %existing.id, "Record already committed");
            clear_conversation(&mut tx, conversation).await?;
            tx.commit()
                .await
                .map_err(|e| persistence_error("Failed to commit transaction", e))?;
            return Ok(existing);
        }

        for value in UniqueValue::collect(definition, conversation) {
            let result = sqlx::query(
                r#"
                INSERT INTO record_unique_values (dialogue, field, value, record_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&value.dialogue)
            .bind(&value.field)
            .bind(&value.value)
            .bind(record.id.as_uuid())
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => {}
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    debug!(
                        dialogue = %value.dialogue,
                        field = %value.field,
                        "Unique value already taken, rolling back commit"
                    );
                    return Err(PersistenceError::Integrity(value.conflict_message()));
                }
                Err(e) => return Err(persistence_error("Failed to claim unique value", e)),
            }
        }

        clear_conversation(&mut tx, conversation).await?;
        tx.commit()
            .await
            .map_err(|e| persistence_error("Failed to commit transaction", e))?;

        Ok(record)
    }
}

async fn clear_conversation(
    tx: &mut Transaction<'_, Postgres>,
    conversation: &Conversation,
) -> Result<(), PersistenceError> {
    let key = conversation.key();
    sqlx::query("DELETE FROM conversations WHERE chat_id = $1 AND user_id = $2")
        .bind(key.chat_id.as_i64())
        .bind(key.user_id.as_i64())
        .execute(&mut **tx)
        .await
        .map_err(|e| persistence_error("Failed to clear conversation", e))?;
    Ok(())
}
