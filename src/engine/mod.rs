//! Execution engine module
//!
//! Main read loop: fetch a page, split it by calendar day, then write, upload
//! and delete one Parquet file per day.
//!
//! # Overview
//!
//! The engine module provides:
//! - `ExportPipeline` - Drives extraction until the source returns an empty page
//! - `BatchExporter` - Writes, uploads and deletes the files of one batch
//! - `PipelineSettings` - Configuration for one pipeline
//! - `ExportSummary` / `BatchReport` - What was uploaded and what failed

mod types;

pub use types::{
    BatchReport, ExportSummary, PartitionOutcome, PipelineSettings, PipelineState, UploadFailure,
    UploadedFile,
};

use crate::config::ExportConfig;
use crate::database::TableSource;
use crate::error::Result;
use crate::output::{
    write_batch_to_parquet, CloudDestination, ObjectKey, SequenceCounter, TempParquetFile,
    Uploader, WorkingDir,
};
use crate::pagination::{BatchSource, Extractor, PaginationState};
use crate::partition::{partition_by_day, DayPartition};
use arrow::record_batch::RecordBatch;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Export pipeline for one source table
///
/// The source is only touched between batches. Partition export borrows
/// just the [`BatchExporter`], so the run future stays `Send` even though
/// database connections are not `Sync`.
pub struct ExportPipeline {
    /// Paged reader over the source
    extractor: Extractor<Box<dyn BatchSource>>,
    exporter: BatchExporter,
    state: PipelineState,
}

/// Write, upload and delete stage shared by every batch of a run
pub struct BatchExporter {
    /// Destination for finished files
    uploader: Arc<dyn Uploader>,
    settings: PipelineSettings,
    working_dir: WorkingDir,
    /// Run-wide file numbering
    sequence: SequenceCounter,
}

impl ExportPipeline {
    /// Create a pipeline from its parts, preparing the working directory
    pub fn new(
        source: Box<dyn BatchSource>,
        uploader: Arc<dyn Uploader>,
        settings: PipelineSettings,
    ) -> Result<Self> {
        let extractor = Extractor::new(source, settings.chunk_size)?;
        let working_dir = WorkingDir::prepare(&settings.working_dir)?;

        Ok(Self {
            extractor,
            exporter: BatchExporter {
                uploader,
                settings,
                working_dir,
                sequence: SequenceCounter::new(),
            },
            state: PipelineState::Fetching,
        })
    }

    /// Validate the config, connect to the source and build the destination
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        config.validate()?;
        let source = TableSource::open(&config.source)?;
        let destination = CloudDestination::from_config(&config.destination)?;
        Self::new(
            Box::new(source),
            Arc::new(destination),
            PipelineSettings::from_config(config),
        )
    }

    /// Current driver state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Get the settings
    pub fn settings(&self) -> &PipelineSettings {
        &self.exporter.settings
    }

    /// Offset and page counters of the extractor
    pub fn pagination(&self) -> &PaginationState {
        self.extractor.state()
    }

    /// Local working directory
    pub fn working_dir(&self) -> &WorkingDir {
        &self.exporter.working_dir
    }

    /// Sequence numbers handed out so far
    pub fn files_allocated(&self) -> u64 {
        self.exporter.sequence.allocated()
    }

    /// Per-batch export stage
    pub fn exporter(&self) -> &BatchExporter {
        &self.exporter
    }

    /// Run until the source returns an empty page
    ///
    /// Upload failures are collected in the summary. Any other error aborts
    /// the run and is returned.
    pub async fn run(&mut self) -> Result<ExportSummary> {
        let start = Instant::now();
        let mut summary = ExportSummary::default();

        info!(
            source = %self.extractor.source().describe(),
            destination = %self.exporter.uploader.describe(),
            chunk_size = self.exporter.settings.chunk_size,
            "Starting export"
        );

        loop {
            self.transition(PipelineState::Fetching);
            let Some(batch) = self.extractor.next_batch()? else {
                break;
            };

            self.transition(PipelineState::Processing);
            let report = self.exporter.process_batch(&batch).await?;
            summary.absorb(report);
        }

        self.transition(PipelineState::Done);
        info!("No more data to export.");

        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = start.elapsed().as_millis() as u64;
        summary.duration_ms = elapsed_ms;

        if summary.is_complete() {
            info!("Export finished: {summary}");
        } else {
            warn!(
                failed_keys = ?summary.failed_keys(),
                "Export finished with failed uploads: {summary}"
            );
        }

        Ok(summary)
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "Pipeline state");
            self.state = next;
        }
    }
}

impl BatchExporter {
    /// Partition one batch by day and export every partition
    ///
    /// Sequence numbers for all partitions are taken up front, so file numbers
    /// follow first-seen day order even when partitions upload concurrently.
    pub async fn process_batch(&self, batch: &RecordBatch) -> Result<BatchReport> {
        let partitions = partition_by_day(
            batch,
            &self.settings.timestamp_column,
            self.settings.day_boundary,
        )?;

        let mut report = BatchReport {
            rows: batch.num_rows(),
            partitions: partitions.len(),
            ..Default::default()
        };
        debug!(
            rows = report.rows,
            partitions = report.partitions,
            "Partitioned batch"
        );

        let numbered: Vec<(u64, DayPartition)> = partitions
            .into_iter()
            .map(|partition| (self.sequence.next(), partition))
            .collect();

        let outcomes: Vec<PartitionOutcome> = stream::iter(numbered)
            .map(|(seq, partition)| self.export_partition(seq, partition))
            .buffered(self.settings.upload_concurrency.max(1))
            .try_collect()
            .await?;

        for outcome in outcomes {
            report.record(outcome);
        }
        Ok(report)
    }

    /// Write, upload and delete the file for one partition
    async fn export_partition(&self, seq: u64, partition: DayPartition) -> Result<PartitionOutcome> {
        let key = ObjectKey::new(&self.settings.key_prefix, partition.day, seq);
        let file = TempParquetFile::new(self.working_dir.file_path(seq));

        let rows = write_batch_to_parquet(file.path(), &partition.batch, Some(&self.settings.writer))?;
        let path = file.path().display().to_string();
        info!("Exported {rows} rows to {path}");

        let upload = self.uploader.upload(file.path(), &key).await;
        file.remove()?;

        let outcome = match upload {
            Ok(location) => {
                info!("Uploaded {path} to {location}");
                PartitionOutcome::Uploaded(UploadedFile {
                    key: key.to_string(),
                    day: partition.day,
                    seq,
                    rows,
                    location,
                })
            }
            Err(e) => {
                warn!("Failed to upload {path}: {e}");
                PartitionOutcome::Failed(UploadFailure {
                    key: key.to_string(),
                    day: partition.day,
                    seq,
                    rows,
                    error: e.to_string(),
                })
            }
        };
        Ok(outcome)
    }
}
