//! Day bucketing
//!
//! Splits one batch into per-day partitions, keeping the order in which
//! days first appear and the row order inside each day.

use super::timestamps::parse_timestamp_column;
use super::types::{DayBoundary, DayPartition};
use crate::error::{Error, Result};
use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

/// Group the rows of a batch by the calendar day of `column`
///
/// Every row lands in exactly one partition. Fails on the first row whose
/// timestamp cannot be parsed.
pub fn partition_by_day(
    batch: &RecordBatch,
    column: &str,
    boundary: DayBoundary,
) -> Result<Vec<DayPartition>> {
    if batch.num_rows() == 0 {
        return Ok(Vec::new());
    }

    let index = batch
        .schema()
        .index_of(column)
        .map_err(|_| Error::MissingColumn {
            column: column.to_string(),
        })?;

    let parsed = parse_timestamp_column(batch.column(index), column)?;
    let batch = match parsed.normalized {
        Some(replacement) => replace_column(batch, index, replacement)?,
        None => batch.clone(),
    };

    let mut groups: Vec<(NaiveDate, Vec<u32>)> = Vec::new();
    let mut slots: HashMap<NaiveDate, usize> = HashMap::new();

    for (row, value) in parsed.values.iter().enumerate() {
        let day = boundary.day_of_row(*value);
        let slot = *slots.entry(day).or_insert_with(|| {
            groups.push((day, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row as u32);
    }

    if groups.len() == 1 {
        let (day, _) = groups.remove(0);
        return Ok(vec![DayPartition { day, batch }]);
    }

    groups
        .into_iter()
        .map(|(day, rows)| {
            let indices = UInt32Array::from(rows);
            let rows = take_record_batch(&batch, &indices)?;
            Ok(DayPartition { day, batch: rows })
        })
        .collect()
}

/// Swap one column for its timestamp-typed replacement, keeping position
fn replace_column(batch: &RecordBatch, index: usize, column: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let original = schema.field(index);

    let mut fields = schema.fields().to_vec();
    fields[index] = Arc::new(Field::new(
        original.name(),
        column.data_type().clone(),
        original.is_nullable(),
    ));

    let mut columns = batch.columns().to_vec();
    columns[index] = column;

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}
