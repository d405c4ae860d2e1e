//! Tests for pagination module

use super::*;
use crate::error::{Error, Result};
use arrow::array::Int64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

fn table(rows: usize) -> RecordBatch {
    let schema = Schema::new(vec![Field::new("id", DataType::Int64, false)]);
    let ids: Vec<i64> = (0..rows as i64).collect();
    RecordBatch::try_new(Arc::new(schema), vec![Arc::new(Int64Array::from(ids))]).unwrap()
}

/// Records every (offset, limit) request
struct RecordingSource {
    inner: MemorySource,
    calls: Vec<(u64, u64)>,
}

impl BatchSource for RecordingSource {
    fn fetch(&mut self, offset: u64, limit: u64) -> Result<RecordBatch> {
        self.calls.push((offset, limit));
        self.inner.fetch(offset, limit)
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}

struct BrokenSource;

impl BatchSource for BrokenSource {
    fn fetch(&mut self, _offset: u64, _limit: u64) -> Result<RecordBatch> {
        Err(Error::database("connection reset by peer"))
    }

    fn describe(&self) -> String {
        "broken".to_string()
    }
}

fn drain<S: BatchSource>(extractor: &mut Extractor<S>) -> Vec<usize> {
    let mut sizes = Vec::new();
    while let Some(batch) = extractor.next_batch().unwrap() {
        sizes.push(batch.num_rows());
    }
    sizes
}

// ============================================================================
// PaginationState Tests
// ============================================================================

#[test]
fn test_pagination_state_default() {
    let state = PaginationState::new();
    assert_eq!(state.offset, 0);
    assert_eq!(state.pages, 0);
    assert_eq!(state.total_fetched, 0);
    assert!(!state.done);
}

#[test]
fn test_pagination_state_advance_by_limit() {
    let mut state = PaginationState::with_offset(100);
    state.advance(50, 12);
    assert_eq!(state.offset, 150);
    assert_eq!(state.pages, 1);
    assert_eq!(state.total_fetched, 12);

    state.mark_done();
    assert!(state.done);
}

// ============================================================================
// MemorySource Tests
// ============================================================================

#[test]
fn test_memory_source_slices() {
    let mut source = MemorySource::new(table(7));
    assert_eq!(source.fetch(0, 5).unwrap().num_rows(), 5);
    assert_eq!(source.fetch(5, 5).unwrap().num_rows(), 2);
    assert_eq!(source.fetch(10, 5).unwrap().num_rows(), 0);
    assert_eq!(source.fetches(), 3);
}

// ============================================================================
// Extractor Tests
// ============================================================================

#[test]
fn test_extractor_partial_last_page() {
    let source = RecordingSource {
        inner: MemorySource::new(table(15_000)),
        calls: Vec::new(),
    };
    let mut extractor = Extractor::new(source, 10_000).unwrap();

    assert_eq!(drain(&mut extractor), vec![10_000, 5_000]);
    assert_eq!(
        extractor.source().calls,
        vec![(0, 10_000), (10_000, 10_000), (20_000, 10_000)]
    );
    assert_eq!(extractor.state().total_fetched, 15_000);
    assert!(extractor.state().done);
}

#[test]
fn test_extractor_exact_multiple_fetches_once_more() {
    let source = RecordingSource {
        inner: MemorySource::new(table(20)),
        calls: Vec::new(),
    };
    let mut extractor = Extractor::new(source, 10).unwrap();

    assert_eq!(drain(&mut extractor), vec![10, 10]);
    assert_eq!(extractor.source().calls.len(), 3);
    assert_eq!(extractor.state().pages, 3);
}

#[test]
fn test_extractor_empty_table() {
    let mut extractor = Extractor::new(MemorySource::new(table(0)), 10_000).unwrap();

    assert!(extractor.next_batch().unwrap().is_none());
    assert_eq!(extractor.source().fetches(), 1);

    // Done stays done without touching the source again
    assert!(extractor.next_batch().unwrap().is_none());
    assert_eq!(extractor.source().fetches(), 1);
}

#[test]
fn test_extractor_zero_limit_rejected() {
    assert!(Extractor::new(MemorySource::new(table(1)), 0).is_err());
}

#[test]
fn test_extractor_source_failure_is_fatal() {
    let mut extractor = Extractor::new(BrokenSource, 10).unwrap();
    let err = extractor.next_batch().unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, Error::Database { .. }));
}

#[test]
fn test_extractor_boxed_source() {
    let source: Box<dyn BatchSource> = Box::new(MemorySource::new(table(3)));
    let mut extractor = Extractor::new(source, 2).unwrap();
    assert_eq!(drain(&mut extractor), vec![2, 1]);
}
