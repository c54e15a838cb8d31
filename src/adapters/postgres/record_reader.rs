//! PostgreSQL implementation of RecordReader.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::errors::store_error;
use crate::domain::foundation::{ChatId, Page, Pagination, RecordId, Timestamp, UserId};
use crate::domain::record::PersistedRecord;
use crate::ports::{RecordReader, StoreError};

/// PostgreSQL implementation of RecordReader.
#[derive(Clone)]
pub struct PostgresRecordReader {
    pool: PgPool,
}

impl PostgresRecordReader {
    /// Creates a new PostgresRecordReader.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordReader for PostgresRecordReader {
    async fn list(
        &self,
        dialogue: &str,
        pagination: Pagination,
    ) -> Result<Page<PersistedRecord>, StoreError> {
        let pagination = pagination.clamped();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE dialogue = $1")
            .bind(dialogue)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("Failed to count records", e))?;

        let rows = sqlx::query(
            r#"
            SELECT id, dialogue, chat_id, submitted_by, fields, created_at
            FROM records
            WHERE dialogue = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(dialogue)
        .bind(i64::from(pagination.limit))
        .bind(i64::from(pagination.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("Failed to list records", e))?;

        let items = rows
            .iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total.max(0) as u64, pagination))
    }
}

pub(super) fn row_to_record(row: &PgRow) -> Result<PersistedRecord, StoreError> {
    let column = |e: sqlx::Error| store_error("Failed to read record row", e);

    let id: Uuid = row.try_get("id").map_err(column)?;
    let dialogue: String = row.try_get("dialogue").map_err(column)?;
    let chat_id: i64 = row.try_get("chat_id").map_err(column)?;
    let submitted_by: i64 = row.try_get("submitted_by").map_err(column)?;
    let fields: serde_json::Value = row.try_get("fields").map_err(column)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(column)?;

    Ok(PersistedRecord {
        id: RecordId::from_uuid(id),
        dialogue,
        chat_id: ChatId::new(chat_id),
        submitted_by: UserId::new(submitted_by),
        fields: serde_json::from_value(fields)?,
        created_at: Timestamp::from_datetime(created_at),
    })
}
