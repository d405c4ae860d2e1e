// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # table2parquet
//!
//! Batch export of one database table into day-partitioned Parquet files on
//! object storage.
//!
//! The table is read in `LIMIT`/`OFFSET` pages. Each page is split by the
//! calendar day of a timestamp column, and every day becomes one Parquet file
//! uploaded to `<prefix>/year=YYYY/month=MM/day=DD/data-NNNN.parquet`, where
//! `NNNN` is a sequence number that never repeats within a run.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use table2parquet::{config::ExportConfig, engine::ExportPipeline, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ExportConfig::from_env()?;
//!     let mut pipeline = ExportPipeline::from_config(&config)?;
//!     let summary = pipeline.run().await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐
//! │ database │──▶│ pagination │──▶│ partition │──▶│  output  │──▶│  object  │
//! │ (DuckDB) │   │ LIMIT/OFF. │   │ by day    │   │ Parquet  │   │  store   │
//! └──────────┘   └────────────┘   └───────────┘   └──────────┘   └──────────┘
//!                        ▲              engine drives the loop
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Export configuration from environment or YAML
pub mod config;

/// Source database access via DuckDB
pub mod database;

/// Chunked extraction
pub mod pagination;

/// Calendar-day partitioning
pub mod partition;

/// Parquet writing and object store upload
pub mod output;

/// Export driver loop
pub mod engine;

/// Invocation wrapper
pub mod handler;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::ExportConfig;
pub use engine::{ExportPipeline, ExportSummary};
pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
