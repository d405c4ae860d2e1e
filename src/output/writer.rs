//! Parquet file writer
//!
//! Writes one day partition to a local Parquet file as a single row group.

use crate::config::Compression as CompressionSetting;
use crate::error::{Error, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;

/// Encoding options shared by every partition file of a run
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    /// Upper bound on rows per row group; partitions are written whole
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024,
        }
    }
}

impl From<CompressionSetting> for ParquetWriterConfig {
    fn from(setting: CompressionSetting) -> Self {
        let compression = match setting {
            CompressionSetting::Snappy => Compression::SNAPPY,
            CompressionSetting::Zstd => Compression::ZSTD(ZstdLevel::default()),
            CompressionSetting::Gzip => Compression::GZIP(GzipLevel::default()),
            CompressionSetting::None => Compression::UNCOMPRESSED,
        };
        Self {
            compression,
            ..Self::default()
        }
    }
}

impl ParquetWriterConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size.max(1))
            .build()
    }
}

/// Parquet file writer
pub struct ParquetWriter {
    writer: ArrowWriter<File>,
    rows_written: usize,
}

impl ParquetWriter {
    /// Create the file and a writer for `batch`'s schema
    pub fn new(
        path: impl AsRef<Path>,
        batch: &RecordBatch,
        config: &ParquetWriterConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            Error::output(format!("Failed to create file {}: {e}", path.display()))
        })?;

        let writer = ArrowWriter::try_new(file, batch.schema(), Some(config.build_properties()))
            .map_err(|e| Error::output(format!("Failed to create Parquet writer: {e}")))?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Append a batch
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer
            .write(batch)
            .map_err(|e| Error::output(format!("Failed to write batch: {e}")))?;

        self.rows_written += batch.num_rows();
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Write the footer, returning the row count
    pub fn close(self) -> Result<usize> {
        let rows = self.rows_written;
        self.writer
            .close()
            .map_err(|e| Error::output(format!("Failed to close Parquet writer: {e}")))?;
        Ok(rows)
    }
}

/// Write a partition to `path` as exactly one row group
pub fn write_batch_to_parquet(
    path: impl AsRef<Path>,
    batch: &RecordBatch,
    config: Option<&ParquetWriterConfig>,
) -> Result<usize> {
    let config = config
        .cloned()
        .unwrap_or_default()
        .with_row_group_size(batch.num_rows());

    let mut writer = ParquetWriter::new(path, batch, &config)?;
    writer.write(batch)?;
    writer.close()
}
