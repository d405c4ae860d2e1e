//! Export tests with a real MySQL database
//!
//! These tests require a live MySQL server.
//! Set MYSQL_TEST_URL (DuckDB MySQL connection string, e.g.
//! `host=127.0.0.1 port=3306 user=root password=secret database=test`) to run.

use object_store::memory::InMemory;
use std::sync::Arc;
use table2parquet::config::{DatabaseKind, SourceConfig};
use table2parquet::database::{DatabaseEngine, TableSource};
use table2parquet::engine::{ExportPipeline, PipelineSettings};
use table2parquet::output::CloudDestination;

/// Get test connection string from environment or skip
fn get_test_connection() -> Option<String> {
    std::env::var("MYSQL_TEST_URL").ok()
}

fn source(conn_str: String, table: Option<&str>) -> SourceConfig {
    SourceConfig {
        engine: DatabaseKind::Mysql,
        connection_string: Some(conn_str),
        table: table.map(ToString::to_string),
        ..SourceConfig::default()
    }
}

#[test]
fn test_mysql_connection() {
    let Some(conn_str) = get_test_connection() else {
        println!("Skipping: MYSQL_TEST_URL not set");
        return;
    };

    let engine = DatabaseEngine::new(&source(conn_str, None));
    assert!(
        engine.is_ok(),
        "Failed to create engine: {:?}",
        engine.err()
    );

    let engine = engine.unwrap();
    let check = engine.check_connection();
    assert!(check.is_ok(), "Connection check failed: {:?}", check.err());

    let tables = engine.list_tables().unwrap();
    println!("Found {} tables", tables.len());
}

#[tokio::test]
async fn test_mysql_export_first_table() {
    let Some(conn_str) = get_test_connection() else {
        println!("Skipping: MYSQL_TEST_URL not set");
        return;
    };
    let Ok(timestamp_column) = std::env::var("MYSQL_TEST_TIMESTAMP_COLUMN") else {
        println!("Skipping: MYSQL_TEST_TIMESTAMP_COLUMN not set");
        return;
    };

    let engine = DatabaseEngine::new(&source(conn_str.clone(), None)).unwrap();
    let tables = engine.list_tables().unwrap();
    let Some(table) = tables.first() else {
        println!("Skipping: no tables in test database");
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(InMemory::new());
    let settings = PipelineSettings::new()
        .with_chunk_size(1_000)
        .with_timestamp_column(timestamp_column)
        .with_key_prefix("mysql-test")
        .with_working_dir(dir.path());

    let table_source = TableSource::open(&source(conn_str, Some(table))).unwrap();
    let mut pipeline = ExportPipeline::new(
        Box::new(table_source),
        Arc::new(CloudDestination::from_store(store, "memory://")),
        settings,
    )
    .unwrap();

    let summary = pipeline.run().await.unwrap();
    println!("Exported {table}: {summary}");
    assert!(summary.is_complete());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
