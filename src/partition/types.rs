//! Partition types
//!
//! Defines the calendar-day boundary and the transient day partition.

use crate::error::{Error, Result};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One parsed value of the timestamp column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTime {
    /// Offset-aware value: a point on the UTC timeline
    Instant(DateTime<Utc>),
    /// Date or wall-clock value without a zone; its date is the row's day
    Local(NaiveDateTime),
}

impl RowTime {
    /// UTC instant, reading local values as UTC wall clock
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            Self::Instant(instant) => *instant,
            Self::Local(naive) => naive.and_utc(),
        }
    }
}

/// Where one calendar day ends and the next begins
///
/// Only offset-aware instants are shifted. Dates and zoneless timestamps
/// already name their calendar day and keep it under any boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayBoundary {
    /// Days run from 00:00 to 24:00 UTC
    #[default]
    Utc,
    /// Days run from 00:00 to 24:00 at a fixed UTC offset
    Offset(FixedOffset),
}

impl DayBoundary {
    /// Calendar day an instant falls on
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Utc => instant.date_naive(),
            Self::Offset(offset) => instant.with_timezone(offset).date_naive(),
        }
    }

    /// Calendar day of one parsed row
    pub fn day_of_row(&self, value: RowTime) -> NaiveDate {
        match value {
            RowTime::Instant(instant) => self.day_of(instant),
            RowTime::Local(naive) => naive.date(),
        }
    }
}

impl FromStr for DayBoundary {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(Self::Utc);
        }

        let seconds = parse_offset_seconds(trimmed).ok_or_else(|| {
            Error::invalid_value(
                "day_boundary",
                format!("expected 'utc' or an offset like +05:30, got '{s}'"),
            )
        })?;

        if seconds == 0 {
            return Ok(Self::Utc);
        }

        FixedOffset::east_opt(seconds)
            .map(Self::Offset)
            .ok_or_else(|| Error::invalid_value("day_boundary", format!("offset out of range: {s}")))
    }
}

impl TryFrom<String> for DayBoundary {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DayBoundary> for String {
    fn from(value: DayBoundary) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc => f.write_str("utc"),
            Self::Offset(offset) => write!(f, "{offset}"),
        }
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM` or `+HH` into signed seconds
fn parse_offset_seconds(s: &str) -> Option<i32> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (
            digits[..2].parse::<i32>().ok()?,
            digits[2..].parse::<i32>().ok()?,
        ),
        _ => return None,
    };

    if hours > 23 || minutes > 59 {
        return None;
    }

    Some(sign * (hours * 3600 + minutes * 60))
}

/// Rows of one batch that share a calendar day
///
/// Lives only between grouping and serialization.
#[derive(Debug, Clone)]
pub struct DayPartition {
    /// Calendar day shared by every row
    pub day: NaiveDate,
    /// The rows, in their original batch order
    pub batch: RecordBatch,
}

impl DayPartition {
    /// Number of rows in this partition
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}
