//! Tests for output module

use super::*;
use crate::config::{Compression as CompressionSetting, DestinationConfig};
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use std::fs::File;
use std::sync::Arc;
use tempfile::tempdir;

fn sample_batch(rows: usize) -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
    ]);
    let ids: Vec<i64> = (0..rows as i64).collect();
    let names: Vec<Option<String>> = (0..rows)
        .map(|i| (i % 3 != 0).then(|| format!("row-{i}")))
        .collect();
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(names)),
        ],
    )
    .unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Writer Tests
// ============================================================================

#[test]
fn test_parquet_writer_config_default() {
    let config = ParquetWriterConfig::default();
    assert_eq!(config.compression(), Compression::SNAPPY);
    assert_eq!(config.row_group_size(), 1024 * 1024);
}

#[test]
fn test_parquet_writer_config_from_setting() {
    assert_eq!(
        ParquetWriterConfig::from(CompressionSetting::None).compression(),
        Compression::UNCOMPRESSED
    );
    assert!(matches!(
        ParquetWriterConfig::from(CompressionSetting::Zstd).compression(),
        Compression::ZSTD(_)
    ));
    assert!(matches!(
        ParquetWriterConfig::from(CompressionSetting::Gzip).compression(),
        Compression::GZIP(_)
    ));
}

#[test]
fn test_write_batch_single_row_group() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data-0000.parquet");
    let batch = sample_batch(2_500);

    // A small configured row group size must not split the partition
    let config = ParquetWriterConfig::new().with_row_group_size(100);
    let rows = write_batch_to_parquet(&path, &batch, Some(&config)).unwrap();
    assert_eq!(rows, 2_500);

    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap()).unwrap();
    assert_eq!(builder.metadata().num_row_groups(), 1);
    assert_eq!(builder.metadata().file_metadata().num_rows(), 2_500);
    assert_eq!(builder.schema().fields(), batch.schema().fields());

    let read: Vec<RecordBatch> = builder.build().unwrap().map(|b| b.unwrap()).collect();
    let total: usize = read.iter().map(RecordBatch::num_rows).sum();
    assert_eq!(total, 2_500);
    let ids = read[0].column(0).as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(ids.value(0), 0);
    assert_eq!(ids.value(1), 1);
}

#[test]
fn test_parquet_writer_rows_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rows.parquet");
    let batch = sample_batch(10);

    let mut writer =
        ParquetWriter::new(&path, &batch, &ParquetWriterConfig::default()).unwrap();
    writer.write(&batch).unwrap();
    assert_eq!(writer.rows_written(), 10);
    assert_eq!(writer.close().unwrap(), 10);
}

#[test]
fn test_write_to_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope").join("data-0000.parquet");
    let err = write_batch_to_parquet(&path, &sample_batch(1), None).unwrap_err();
    assert!(err.to_string().contains("Failed to create file"));
}

// ============================================================================
// Key Tests
// ============================================================================

#[test]
fn test_file_name_zero_padded() {
    assert_eq!(file_name(0), "data-0000.parquet");
    assert_eq!(file_name(42), "data-0042.parquet");
    assert_eq!(file_name(12_345), "data-12345.parquet");
}

#[test]
fn test_object_key_layout() {
    let key = ObjectKey::new("my-bucket", day(2024, 1, 15), 0);
    assert_eq!(
        key.to_string(),
        "my-bucket/year=2024/month=01/day=15/data-0000.parquet"
    );
    assert_eq!(key.partition_dir(), "my-bucket/year=2024/month=01/day=15/");
}

#[test]
fn test_object_key_without_prefix() {
    let key = ObjectKey::new("", day(2023, 12, 31), 7);
    assert_eq!(key.to_string(), "year=2023/month=12/day=31/data-0007.parquet");

    let trimmed = ObjectKey::new("/exports/", day(2023, 12, 31), 7);
    assert_eq!(
        trimmed.to_string(),
        "exports/year=2023/month=12/day=31/data-0007.parquet"
    );
}

#[test]
fn test_sequence_counter_monotonic() {
    let counter = SequenceCounter::new();
    assert_eq!(counter.next(), 0);
    assert_eq!(counter.next(), 1);
    assert_eq!(counter.allocated(), 2);

    let resumed = SequenceCounter::starting_at(10);
    assert_eq!(resumed.next(), 10);
}

#[test]
fn test_sequence_counter_concurrent_unique() {
    let counter = Arc::new(SequenceCounter::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let counter = Arc::clone(&counter);
            std::thread::spawn(move || (0..250).map(|_| counter.next()).collect::<Vec<_>>())
        })
        .collect();

    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 1_000);
    assert_eq!(counter.allocated(), 1_000);
}

// ============================================================================
// Local File Tests
// ============================================================================

#[test]
fn test_working_dir_prepare_creates_nested() {
    let dir = tempdir().unwrap();
    let working = WorkingDir::prepare(dir.path().join("a").join("b")).unwrap();
    assert!(working.path().is_dir());
    assert!(working.is_clean().unwrap());
    assert_eq!(
        working.file_path(3),
        dir.path().join("a").join("b").join("data-0003.parquet")
    );
}

#[test]
fn test_temp_file_remove() {
    let dir = tempdir().unwrap();
    let working = WorkingDir::prepare(dir.path()).unwrap();
    let path = working.file_path(0);
    std::fs::write(&path, b"x").unwrap();
    assert!(!working.is_clean().unwrap());

    TempParquetFile::new(path.clone()).remove().unwrap();
    assert!(!path.exists());
    assert!(working.is_clean().unwrap());
}

#[test]
fn test_temp_file_removed_on_drop() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data-0001.parquet");
    std::fs::write(&path, b"x").unwrap();
    {
        let _file = TempParquetFile::new(path.clone());
    }
    assert!(!path.exists());
}

#[test]
fn test_temp_file_remove_missing_is_ok() {
    let dir = tempdir().unwrap();
    let file = TempParquetFile::new(dir.path().join("never-written.parquet"));
    assert!(file.remove().is_ok());
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_to_memory_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data-0000.parquet");
    write_batch_to_parquet(&path, &sample_batch(5), None).unwrap();
    let expected = std::fs::read(&path).unwrap();

    let store = Arc::new(InMemory::new());
    let destination = CloudDestination::from_store(store.clone(), "memory://");
    let key = ObjectKey::new("bucket", day(2024, 1, 15), 0);

    let uri = destination.upload(&path, &key).await.unwrap();
    assert!(uri.ends_with("bucket/year=2024/month=01/day=15/data-0000.parquet"));

    let stored = store
        .get(&destination.object_path(&key))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(stored.as_ref(), expected.as_slice());
}

#[tokio::test]
async fn test_upload_missing_local_file_is_upload_error() {
    let dir = tempdir().unwrap();
    let destination = CloudDestination::from_store(Arc::new(InMemory::new()), "memory://");
    let key = ObjectKey::new("bucket", day(2024, 1, 15), 1);

    let err = destination
        .upload(&dir.path().join("gone.parquet"), &key)
        .await
        .unwrap_err();
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_parse_file_url_writes_to_disk() {
    let dir = tempdir().unwrap();
    let url = format!("file://{}", dir.path().join("lake").display());
    let destination = CloudDestination::parse(&url).unwrap();
    let key = ObjectKey::new("bucket", day(2024, 2, 29), 3);

    destination.put(&key, bytes::Bytes::from_static(b"abc")).await.unwrap();

    let written = dir
        .path()
        .join("lake/bucket/year=2024/month=02/day=29/data-0003.parquet");
    assert_eq!(std::fs::read(written).unwrap(), b"abc");
}

#[test]
fn test_parse_memory_url_with_base() {
    let destination = CloudDestination::parse("memory://scratch/exports").unwrap();
    let key = ObjectKey::new("b", day(2024, 1, 1), 0);
    assert_eq!(
        destination.object_path(&key).as_ref(),
        "exports/b/year=2024/month=01/day=01/data-0000.parquet"
    );
    assert_eq!(destination.describe(), "memory://scratch/exports");
}

#[test]
fn test_parse_unknown_scheme_rejected() {
    assert!(CloudDestination::parse("ftp://host/path").is_err());
    assert!(CloudDestination::parse("not a url").is_err());
}

#[test]
fn test_from_config_requires_bucket() {
    let err = CloudDestination::from_config(&DestinationConfig::default()).unwrap_err();
    assert!(err.to_string().contains("S3_BUCKET"));
}

#[test]
fn test_from_config_builds_s3_client() {
    let config = DestinationConfig {
        bucket: Some("my-bucket".to_string()),
        access_key_id: Some("AKIA".to_string()),
        secret_access_key: Some("secret".to_string()),
        endpoint: Some("http://localhost:9000".to_string()),
        allow_http: true,
        ..Default::default()
    };
    let destination = CloudDestination::from_config(&config).unwrap();
    assert_eq!(destination.describe(), "s3://my-bucket");
}
