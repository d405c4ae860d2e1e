//! Object keys, file names and the run-wide sequence counter

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Local and remote file name for a sequence number: `data-0042.parquet`
pub fn file_name(seq: u64) -> String {
    format!("data-{seq:04}.parquet")
}

/// Strictly increasing, never reused sequence numbers for one run
///
/// Atomic so that concurrent partition exports can allocate safely.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: AtomicU64,
}

impl SequenceCounter {
    /// Counter starting at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter starting at `start`
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Allocate the next number
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Numbers allocated so far (the next value to be handed out)
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

/// Destination key of one partition file
///
/// Renders as `<prefix>/year=YYYY/month=MM/day=DD/data-NNNN.parquet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    prefix: String,
    day: NaiveDate,
    seq: u64,
}

impl ObjectKey {
    /// Build a key
    pub fn new(prefix: impl Into<String>, day: NaiveDate, seq: u64) -> Self {
        Self {
            prefix: prefix.into().trim_matches('/').to_string(),
            day,
            seq,
        }
    }

    /// Calendar day in the key
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    /// Sequence number in the key
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Key path without the file name, with a trailing slash
    pub fn partition_dir(&self) -> String {
        let dir = format!(
            "year={}/month={:02}/day={:02}/",
            self.day.year(),
            self.day.month(),
            self.day.day()
        );
        if self.prefix.is_empty() {
            dir
        } else {
            format!("{}/{dir}", self.prefix)
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.partition_dir(), file_name(self.seq))
    }
}

impl Serialize for ObjectKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
