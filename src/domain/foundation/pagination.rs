//! Offset pagination for read-side queries.

use serde::{Deserialize, Serialize};

/// Window into an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: u32,
    pub limit: u32,
}

impl Pagination {
    /// Largest page a reader will hand out.
    pub const MAX_LIMIT: u32 = 50;

    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Returns a copy with `limit` clamped to `1..=MAX_LIMIT`.
    pub fn clamped(self) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
        }
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when more items exist after this page.
    pub fn has_more(&self) -> bool {
        (self.offset as u64 + self.items.len() as u64) < self.total
    }
}
