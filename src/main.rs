// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]

//! table2parquet CLI
//!
//! Exports a database table to day-partitioned Parquet files in object storage

use clap::Parser;
use table2parquet::cli::{Cli, Runner};

#[tokio::main]
async fn main() {
    load_dotenv();

    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);

    match runner.run().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Load `.env` before any config is read
fn load_dotenv() {
    if let Err(e) = table2parquet::config::load_dotenv() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
