//! Record reader port (read side).
//!
//! Paginated access to committed records for administrators.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::foundation::{Page, Pagination};
use crate::domain::record::PersistedRecord;

/// Read-only access to committed records.
#[async_trait]
pub trait RecordReader: Send + Sync {
    /// Lists records of `dialogue`, newest first.
    ///
    /// The page size is clamped to `1..=Pagination::MAX_LIMIT`.
    async fn list(
        &self,
        dialogue: &str,
        pagination: Pagination,
    ) -> Result<Page<PersistedRecord>, StoreError>;
}
