//! Zero-argument invocation entry point
//!
//! Wraps a full export run for schedulers and serverless runtimes that expect
//! a `{ "statusCode": ..., "body": ... }` response.

use crate::config::{load_dotenv, ExportConfig};
use crate::engine::{ExportPipeline, ExportSummary};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Response returned to the invoker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    /// Response for a run that reached the empty page
    ///
    /// Status stays 200 when uploads failed; the body names the missing keys.
    pub fn completed(summary: &ExportSummary) -> Self {
        let body = if summary.is_complete() {
            "Export completed".to_string()
        } else {
            format!(
                "Export completed with {} failed uploads: {}",
                summary.failed.len(),
                summary.failed_keys().join(", ")
            )
        };
        Self {
            status_code: 200,
            body,
        }
    }

    /// Response for a run aborted by a fatal error
    pub fn failed(error: &crate::Error) -> Self {
        Self {
            status_code: 500,
            body: format!("Export failed: {error}"),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Run one export configured from the environment
///
/// A `.env` file is loaded first; variables already set take precedence.
pub async fn handle() -> InvocationResponse {
    match load_dotenv().and_then(|_| ExportConfig::from_env()) {
        Ok(config) => handle_with(&config).await,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            InvocationResponse::failed(&e)
        }
    }
}

/// Run one export with an explicit config
pub async fn handle_with(config: &ExportConfig) -> InvocationResponse {
    match run_export(config).await {
        Ok(summary) => InvocationResponse::completed(&summary),
        Err(e) => {
            tracing::error!("Export failed: {e}");
            InvocationResponse::failed(&e)
        }
    }
}

/// Build a pipeline from config and run it to completion
pub async fn run_export(config: &ExportConfig) -> Result<ExportSummary> {
    let mut pipeline = ExportPipeline::from_config(config)?;
    pipeline.run().await
}
