//! Source database access via DuckDB
//!
//! DuckDB attaches the source (MySQL, PostgreSQL, SQLite or a DuckDB file)
//! read-only and returns every page as an Arrow `RecordBatch`.

mod engine;

pub use engine::{DatabaseEngine, TableSource};
