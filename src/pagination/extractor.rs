//! Chunked extraction over a [`BatchSource`]

use super::types::{BatchSource, PaginationState};
use crate::error::{Error, Result};
use arrow::record_batch::RecordBatch;

/// Memory-bounded pagination over a source table
///
/// Offsets advance by exactly `limit` per fetch regardless of how many rows
/// came back. Extraction ends on the first empty page.
pub struct Extractor<S> {
    source: S,
    limit: u64,
    state: PaginationState,
}

impl<S: BatchSource> Extractor<S> {
    /// Create an extractor reading `limit` rows per page
    pub fn new(source: S, limit: u64) -> Result<Self> {
        if limit == 0 {
            return Err(Error::invalid_value("chunk_size", "must be at least 1"));
        }
        Ok(Self {
            source,
            limit,
            state: PaginationState::new(),
        })
    }

    /// Fetch the next batch, or `None` once the source is exhausted
    pub fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        if self.state.done {
            return Ok(None);
        }

        let offset = self.state.offset;
        let batch = self.source.fetch(offset, self.limit)?;
        let rows = batch.num_rows() as u64;
        self.state.advance(self.limit, rows);

        if rows == 0 {
            self.state.mark_done();
            return Ok(None);
        }

        tracing::debug!(offset, rows, "Fetched batch");
        Ok(Some(batch))
    }

    /// Current pagination state
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Rows per page
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Underlying source
    pub fn source(&self) -> &S {
        &self.source
    }
}
