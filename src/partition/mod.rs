//! Partition module
//!
//! Turns one extracted batch into calendar-day partitions.
//!
//! # Overview
//!
//! - Strict parsing of the configured timestamp column (any failure aborts)
//! - Day boundaries in UTC or at a fixed offset for zoned values
//! - Stable grouping: days appear in first-seen order, rows keep batch order

mod day;
mod timestamps;
mod types;

pub use day::partition_by_day;
pub use timestamps::{parse_timestamp_column, parse_timestamp_str, TimestampColumn};
pub use types::{DayBoundary, DayPartition, RowTime};
