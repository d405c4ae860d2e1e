//! Output module
//!
//! Turns day partitions into Parquet files and ships them to object storage.
//!
//! # Overview
//!
//! - [`write_batch_to_parquet`] writes one partition as a single-row-group file
//! - [`ObjectKey`] renders the `year=/month=/day=` destination key
//! - [`SequenceCounter`] hands out run-wide file numbers
//! - [`WorkingDir`] and [`TempParquetFile`] own the local files
//! - [`Uploader`] / [`CloudDestination`] push files to S3, GCS, Azure or a local store

mod cloud;
mod key;
mod local;
mod writer;

pub use cloud::{CloudDestination, Uploader};
pub use key::{file_name, ObjectKey, SequenceCounter};
pub use local::{TempParquetFile, WorkingDir};
pub use writer::{write_batch_to_parquet, ParquetWriter, ParquetWriterConfig};

#[cfg(test)]
mod tests;
