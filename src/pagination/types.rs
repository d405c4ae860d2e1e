//! Pagination types and traits
//!
//! Defines the source capability and the offset state shared by all reads.

use crate::error::Result;
use arrow::record_batch::RecordBatch;

/// A read-only, paginated view of a source table
///
/// `fetch` returns at most `limit` rows starting at `offset`, and an empty
/// batch once no rows remain at that offset.
pub trait BatchSource: Send {
    /// Fetch one page
    fn fetch(&mut self, offset: u64, limit: u64) -> Result<RecordBatch>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

impl<S: BatchSource + ?Sized> BatchSource for Box<S> {
    fn fetch(&mut self, offset: u64, limit: u64) -> Result<RecordBatch> {
        (**self).fetch(offset, limit)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Tracks the state of pagination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    /// Offset of the next page
    pub offset: u64,
    /// Pages fetched so far, including the final empty one
    pub pages: u64,
    /// Total rows fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state with a starting offset
    pub fn with_offset(offset: u64) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Record one fetched page and advance by the full limit
    pub fn advance(&mut self, limit: u64, rows: u64) {
        self.pages += 1;
        self.total_fetched += rows;
        self.offset += limit;
    }
}
