//! In-memory record reader.

use async_trait::async_trait;

use super::InMemoryDatabase;
use crate::domain::foundation::{Page, Pagination};
use crate::domain::record::PersistedRecord;
use crate::ports::{RecordReader, StoreError};

/// In-memory [`RecordReader`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordReader {
    db: InMemoryDatabase,
}

impl InMemoryRecordReader {
    pub fn new(db: InMemoryDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordReader for InMemoryRecordReader {
    async fn list(
        &self,
        dialogue: &str,
        pagination: Pagination,
    ) -> Result<Page<PersistedRecord>, StoreError> {
        let pagination = pagination.clamped();
        let tables = self.db.tables().read().await;

        let matching: Vec<&PersistedRecord> = tables
            .records
            .iter()
            .rev()
            .filter(|r| r.dialogue == dialogue)
            .collect();
        let items = matching
            .iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .map(|r| (*r).clone())
            .collect();

        Ok(Page::new(items, matching.len() as u64, pagination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ChatId, RecordId, Timestamp, UserId};
    use std::collections::BTreeMap;

    fn record(dialogue: &str, secs: i64) -> PersistedRecord {
        PersistedRecord {
            id: RecordId::new(),
            dialogue: dialogue.to_string(),
            chat_id: ChatId::new(1),
            submitted_by: UserId::new(1),
            fields: BTreeMap::new(),
            created_at: Timestamp::from_unix_secs(secs),
        }
    }

    async fn seeded() -> (InMemoryDatabase, Vec<PersistedRecord>) {
        let db = InMemoryDatabase::new();
        let records = vec![
            record("client", 1),
            record("harvest", 2),
            record("client", 3),
            record("client", 4),
        ];
        db.tables().write().await.records.extend(records.clone());
        (db, records)
    }

    #[tokio::test]
    async fn lists_newest_first_for_one_dialogue() {
        let (db, records) = seeded().await;

        let page = db
            .record_reader()
            .list("client", Pagination::new(0, 10))
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        let ids: Vec<_> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![records[3].id, records[2].id, records[0].id]);
    }

    #[tokio::test]
    async fn pages_with_offset_and_limit() {
        let (db, records) = seeded().await;

        let page = db
            .record_reader()
            .list("client", Pagination::new(1, 1))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, records[2].id);
        assert!(page.has_more());
    }

    #[tokio::test]
    async fn zero_limit_is_clamped_to_one() {
        let (db, _) = seeded().await;

        let page = db
            .record_reader()
            .list("client", Pagination::new(0, 0))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
    }
}
