//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ExportConfig;
use crate::database::DatabaseEngine;
use crate::engine::{ExportPipeline, ExportSummary};
use crate::error::Result;
use crate::handler;
use crate::output::{CloudDestination, Uploader};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Exit status when `--strict-uploads` is set and some upload failed
pub const EXIT_PARTIAL_UPLOAD: i32 = 2;

/// Result of `check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub ok: bool,
    pub message: String,
}

impl CheckReport {
    /// Combine the source table count and the destination description
    pub fn new(source: &Result<usize>, destination: &Result<String>) -> Self {
        let (ok, message) = match (source, destination) {
            (Ok(table_count), Ok(dest)) => (
                true,
                format!("Connection successful. Found {table_count} tables. Destination: {dest}"),
            ),
            (Err(e), _) => (false, format!("Connection check failed: {e}")),
            (_, Err(e)) => (false, format!("Destination check failed: {e}")),
        };
        Self { ok, message }
    }
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, returning the process exit status
    pub async fn run(&self) -> Result<i32> {
        match &self.cli.command {
            Commands::Run {
                chunk_size,
                working_dir,
                timestamp_column,
                strict_uploads,
            } => {
                let mut config = self.load_config()?;
                apply_overrides(
                    &mut config,
                    *chunk_size,
                    working_dir.clone(),
                    timestamp_column.clone(),
                );
                self.export(&config, *strict_uploads).await
            }
            Commands::Check => self.check(),
            Commands::Tables => self.tables(),
            Commands::Invoke => self.invoke().await,
        }
    }

    /// Load config from `--config` or the environment
    fn load_config(&self) -> Result<ExportConfig> {
        match &self.cli.config {
            Some(path) => ExportConfig::from_yaml_file(path),
            None => ExportConfig::from_env(),
        }
    }

    async fn export(&self, config: &ExportConfig, strict_uploads: bool) -> Result<i32> {
        let mut pipeline = ExportPipeline::from_config(config)?;
        let summary = pipeline.run().await?;

        self.output_summary(&summary);

        if strict_uploads && !summary.is_complete() {
            return Ok(EXIT_PARTIAL_UPLOAD);
        }
        Ok(0)
    }

    fn check(&self) -> Result<i32> {
        let config = self.load_config()?;
        tracing::info!("Checking connection to {} database", config.source.engine);

        let source = DatabaseEngine::new(&config.source).and_then(|engine| {
            engine.check_connection()?;
            Ok(engine.list_tables()?.len())
        });
        let destination =
            CloudDestination::from_config(&config.destination).map(|dest| dest.describe());

        let report = CheckReport::new(&source, &destination);
        match self.cli.format {
            OutputFormat::Json => {
                self.output_message(&json!({ "type": "CHECK", "check": report }));
            }
            OutputFormat::Pretty => println!("{}", report.message),
        }

        Ok(if report.ok { 0 } else { 1 })
    }

    fn tables(&self) -> Result<i32> {
        let config = self.load_config()?;
        let engine = DatabaseEngine::new(&config.source)?;
        let tables = engine.list_tables()?;

        self.output_message(&json!({
            "type": "TABLES",
            "tables": tables,
            "engine": config.source.engine.to_string(),
        }));

        Ok(0)
    }

    async fn invoke(&self) -> Result<i32> {
        let response = match self.load_config() {
            Ok(config) => handler::handle_with(&config).await,
            Err(e) => handler::InvocationResponse::failed(&e),
        };

        self.output_message(&serde_json::to_value(&response)?);
        Ok(if response.is_success() { 0 } else { 1 })
    }

    fn output_summary(&self, summary: &ExportSummary) {
        match self.cli.format {
            OutputFormat::Json => {
                self.output_message(&json!({ "type": "SUMMARY", "summary": summary }));
            }
            OutputFormat::Pretty => {
                println!("{summary}");
                for file in &summary.uploaded {
                    println!("  uploaded  {} ({} rows)", file.location, file.rows);
                }
                for failure in &summary.failed {
                    println!("  FAILED    {} ({})", failure.key, failure.error);
                }
            }
        }
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Apply command-line values over loaded config
pub fn apply_overrides(
    config: &mut ExportConfig,
    chunk_size: Option<u64>,
    working_dir: Option<PathBuf>,
    timestamp_column: Option<String>,
) {
    if let Some(size) = chunk_size {
        config.chunk_size = size;
    }
    if let Some(dir) = working_dir {
        config.working_dir = dir;
    }
    if let Some(column) = timestamp_column {
        config.timestamp_column = column;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let mut config = ExportConfig::default();
        apply_overrides(&mut config, Some(250), None, Some("event_time".to_string()));
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.timestamp_column, "event_time");
        assert_eq!(config.working_dir, ExportConfig::default().working_dir);
    }

    #[test]
    fn test_check_report_success() {
        let report = CheckReport::new(&Ok(3), &Ok("s3://my-bucket".to_string()));
        assert!(report.ok);
        assert_eq!(
            report.message,
            "Connection successful. Found 3 tables. Destination: s3://my-bucket"
        );
    }

    #[test]
    fn test_check_report_failures() {
        let source = CheckReport::new(
            &Err(crate::Error::config("refused")),
            &Ok("s3://b".to_string()),
        );
        assert!(!source.ok);
        assert!(source.message.starts_with("Connection check failed"));

        let destination = CheckReport::new(&Ok(1), &Err(crate::Error::missing_field("S3_BUCKET")));
        assert!(!destination.ok);
        assert!(destination.message.contains("S3_BUCKET"));

        let json = serde_json::to_value(&destination).unwrap();
        assert_eq!(json["ok"], json!(false));
        assert_eq!(json["message"], json!(destination.message));
    }

    #[test]
    fn test_apply_no_overrides_keeps_config() {
        let mut config = ExportConfig::default();
        config.chunk_size = 42;
        apply_overrides(&mut config, None, None, None);
        assert_eq!(config.chunk_size, 42);
    }
}
