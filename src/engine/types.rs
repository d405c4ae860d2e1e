//! Engine types
//!
//! Settings, driver state and the reports produced by an export run.

use crate::config::{Compression, ExportConfig};
use crate::output::ParquetWriterConfig;
use crate::partition::DayBoundary;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Driver loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Waiting on the next page from the source
    Fetching,
    /// Partitioning, writing and uploading the current page
    Processing,
    /// An empty page was seen
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching => write!(f, "fetching"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Configuration for an export pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Rows per fetched page
    pub chunk_size: u64,
    /// Column whose calendar day partitions the rows
    pub timestamp_column: String,
    /// Where calendar days begin
    pub day_boundary: DayBoundary,
    /// Leading segment of every object key
    pub key_prefix: String,
    /// Local directory for files awaiting upload
    pub working_dir: PathBuf,
    /// Partition files exported at once within a batch
    pub upload_concurrency: usize,
    /// Parquet encoding options
    pub writer: ParquetWriterConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            timestamp_column: "created_at".to_string(),
            day_boundary: DayBoundary::Utc,
            key_prefix: String::new(),
            working_dir: PathBuf::from("parquet_files"),
            upload_concurrency: 1,
            writer: ParquetWriterConfig::from(Compression::default()),
        }
    }
}

impl PipelineSettings {
    /// Create settings with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive settings from a validated export config
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            timestamp_column: config.timestamp_column.clone(),
            day_boundary: config.day_boundary,
            key_prefix: config.destination.key_prefix(),
            working_dir: config.working_dir.clone(),
            upload_concurrency: config.upload_concurrency,
            writer: ParquetWriterConfig::from(config.compression),
        }
    }

    /// Set rows per page
    #[must_use]
    pub fn with_chunk_size(mut self, size: u64) -> Self {
        self.chunk_size = size;
        self
    }

    /// Set the timestamp column
    #[must_use]
    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = column.into();
        self
    }

    /// Set the day boundary
    #[must_use]
    pub fn with_day_boundary(mut self, boundary: DayBoundary) -> Self {
        self.day_boundary = boundary;
        self
    }

    /// Set the key prefix
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Set how many partitions are exported concurrently
    #[must_use]
    pub fn with_upload_concurrency(mut self, concurrency: usize) -> Self {
        self.upload_concurrency = concurrency;
        self
    }
}

/// A partition file that reached the destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub key: String,
    pub day: NaiveDate,
    pub seq: u64,
    pub rows: usize,
    /// Full destination URI reported by the uploader
    pub location: String,
}

/// A partition file whose upload failed; its day is missing from the destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFailure {
    pub key: String,
    pub day: NaiveDate,
    pub seq: u64,
    pub rows: usize,
    pub error: String,
}

/// Outcome of exporting one partition
#[derive(Debug, Clone)]
pub enum PartitionOutcome {
    Uploaded(UploadedFile),
    Failed(UploadFailure),
}

/// What happened to one extracted batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Rows in the batch
    pub rows: usize,
    /// Calendar days the batch split into
    pub partitions: usize,
    pub uploaded: Vec<UploadedFile>,
    pub failed: Vec<UploadFailure>,
}

impl BatchReport {
    pub(crate) fn record(&mut self, outcome: PartitionOutcome) {
        match outcome {
            PartitionOutcome::Uploaded(file) => self.uploaded.push(file),
            PartitionOutcome::Failed(failure) => self.failed.push(failure),
        }
    }
}

/// Result of a whole export run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    /// Non-empty batches processed
    pub batches: usize,
    /// Rows read from the source
    pub rows_extracted: u64,
    /// Files written, in sequence order
    pub uploaded: Vec<UploadedFile>,
    /// Files whose upload failed, in sequence order
    pub failed: Vec<UploadFailure>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl ExportSummary {
    /// Whether every partition file reached the destination
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total files produced, uploaded or not
    pub fn files(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }

    /// Keys missing from the destination
    pub fn failed_keys(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.key.as_str()).collect()
    }

    pub(crate) fn absorb(&mut self, report: BatchReport) {
        self.batches += 1;
        self.rows_extracted += report.rows as u64;
        self.uploaded.extend(report.uploaded);
        self.failed.extend(report.failed);
    }
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows in {} batches, {} files uploaded, {} failed",
            self.rows_extracted,
            self.batches,
            self.uploaded.len(),
            self.failed.len()
        )
    }
}
