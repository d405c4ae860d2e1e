//! In-memory table source

use super::types::BatchSource;
use crate::error::Result;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

/// A table held in memory as one RecordBatch
///
/// Pages are zero-copy slices. Useful for tests and for exporting data that
/// was produced in-process.
#[derive(Debug, Clone)]
pub struct MemorySource {
    table: RecordBatch,
    fetches: usize,
}

impl MemorySource {
    /// Wrap a batch as a table
    pub fn new(table: RecordBatch) -> Self {
        Self { table, fetches: 0 }
    }

    /// Number of fetch calls served so far
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    /// Schema of the table
    pub fn schema(&self) -> SchemaRef {
        self.table.schema()
    }
}

impl BatchSource for MemorySource {
    fn fetch(&mut self, offset: u64, limit: u64) -> Result<RecordBatch> {
        self.fetches += 1;
        let total = self.table.num_rows();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(total);
        let len = usize::try_from(limit).unwrap_or(usize::MAX).min(total - start);
        Ok(self.table.slice(start, len))
    }

    fn describe(&self) -> String {
        format!("in-memory table ({} rows)", self.table.num_rows())
    }
}
