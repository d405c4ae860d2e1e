//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Export a database table to day-partitioned Parquet files in object storage
#[derive(Parser, Debug)]
#[command(name = "table2parquet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); environment variables are used when absent
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the table
    Run {
        /// Rows per fetched page
        #[arg(long)]
        chunk_size: Option<u64>,

        /// Local directory for files awaiting upload
        #[arg(long)]
        working_dir: Option<PathBuf>,

        /// Column whose calendar day partitions the rows
        #[arg(long)]
        timestamp_column: Option<String>,

        /// Exit with status 2 when any upload failed
        #[arg(long)]
        strict_uploads: bool,
    },

    /// Test the source connection and destination settings
    Check,

    /// List tables in the source database
    Tables,

    /// Run once and print the invocation response
    Invoke,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
