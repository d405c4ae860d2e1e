//! Strict timestamp column parsing
//!
//! Every row must yield a value. Nulls and unparseable values are errors.

use super::types::RowTime;
use crate::error::{Error, Result};
use arrow::array::{
    Array, ArrayRef, AsArray, GenericStringArray, OffsetSizeTrait, TimestampMicrosecondArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Date64Type, TimeUnit, TimestampMicrosecondType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;

/// Naive layouts tried after RFC 3339, in order
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parsed timestamp column
#[derive(Debug, Clone)]
pub struct TimestampColumn {
    /// One value per row
    pub values: Vec<RowTime>,
    /// Replacement column when the source was not already a timestamp
    pub normalized: Option<ArrayRef>,
}

/// Parse a column into one value per row
///
/// Timestamp columns keep their values. Zoned ones become instants, zoneless
/// ones stay wall-clock. Date columns keep their date. Date and string columns
/// also get a `Timestamp(Microsecond, "UTC")` replacement, with wall-clock
/// values stored as UTC.
pub fn parse_timestamp_column(array: &ArrayRef, column: &str) -> Result<TimestampColumn> {
    let values = match array.data_type() {
        DataType::Timestamp(_, tz) => {
            let micros = cast(array, &DataType::Timestamp(TimeUnit::Microsecond, tz.clone()))?;
            let micros = micros.as_primitive::<TimestampMicrosecondType>();
            let zoned = tz.is_some();
            let mut values = Vec::with_capacity(micros.len());
            for row in 0..micros.len() {
                if micros.is_null(row) {
                    return Err(null_error(column, row));
                }
                let value = micros.value(row);
                let instant = DateTime::from_timestamp_micros(value).ok_or_else(|| {
                    Error::timestamp_parse(column, row, value.to_string(), "out of range")
                })?;
                values.push(if zoned {
                    RowTime::Instant(instant)
                } else {
                    RowTime::Local(instant.naive_utc())
                });
            }
            return Ok(TimestampColumn {
                values,
                normalized: None,
            });
        }
        DataType::Date32 => {
            let days = array.as_primitive::<Date32Type>();
            let mut values = Vec::with_capacity(days.len());
            for row in 0..days.len() {
                if days.is_null(row) {
                    return Err(null_error(column, row));
                }
                let value = days.value(row);
                let date = DateTime::from_timestamp(i64::from(value) * 86_400, 0)
                    .ok_or_else(|| {
                        Error::timestamp_parse(column, row, value.to_string(), "out of range")
                    })?;
                values.push(RowTime::Local(date.naive_utc()));
            }
            values
        }
        DataType::Date64 => {
            let millis = array.as_primitive::<Date64Type>();
            let mut values = Vec::with_capacity(millis.len());
            for row in 0..millis.len() {
                if millis.is_null(row) {
                    return Err(null_error(column, row));
                }
                let value = millis.value(row);
                let date = DateTime::from_timestamp_millis(value).ok_or_else(|| {
                    Error::timestamp_parse(column, row, value.to_string(), "out of range")
                })?;
                values.push(RowTime::Local(date.naive_utc()));
            }
            values
        }
        DataType::Utf8 => parse_strings(array.as_string::<i32>(), column)?,
        DataType::LargeUtf8 => parse_strings(array.as_string::<i64>(), column)?,
        other => {
            return Err(Error::UnsupportedTimestampType {
                column: column.to_string(),
                data_type: other.to_string(),
            })
        }
    };

    let micros: Vec<i64> = values
        .iter()
        .map(|value| value.instant().timestamp_micros())
        .collect();
    let normalized: ArrayRef =
        Arc::new(TimestampMicrosecondArray::from(micros).with_timezone("UTC"));

    Ok(TimestampColumn {
        values,
        normalized: Some(normalized),
    })
}

fn parse_strings<O: OffsetSizeTrait>(
    strings: &GenericStringArray<O>,
    column: &str,
) -> Result<Vec<RowTime>> {
    let mut values = Vec::with_capacity(strings.len());
    for row in 0..strings.len() {
        if strings.is_null(row) {
            return Err(null_error(column, row));
        }
        let raw = strings.value(row);
        let value = parse_timestamp_str(raw).ok_or_else(|| {
            Error::timestamp_parse(column, row, raw, "unrecognized date/time format")
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Parse a single date/time string
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f][+HH:MM]`,
/// `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM` and `YYYY-MM-DD`.
/// Values with an offset are instants; values without one are wall-clock.
pub fn parse_timestamp_str(raw: &str) -> Option<RowTime> {
    let value = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(RowTime::Instant(dt.with_timezone(&Utc)));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(RowTime::Instant(dt.with_timezone(&Utc)));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(RowTime::Local(naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(RowTime::Local)
}

fn null_error(column: &str, row: usize) -> Error {
    Error::timestamp_parse(column, row, "NULL", "null timestamp")
}
