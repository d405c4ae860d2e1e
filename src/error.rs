//! Error types for table2parquet
//!
//! This module defines the error hierarchy for the whole export pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for table2parquet
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to serialize JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Extraction Errors
    // ============================================================================
    #[error("Database error: {message}")]
    Database { message: String },

    // ============================================================================
    // Partitioning Errors
    // ============================================================================
    #[error("Timestamp column '{column}' not found in batch")]
    MissingColumn { column: String },

    #[error("Failed to parse timestamp in column '{column}' at row {row} ({value}): {message}")]
    TimestampParse {
        column: String,
        row: usize,
        value: String,
        message: String,
    },

    #[error("Column '{column}' has type {data_type}, which cannot be read as a timestamp")]
    UnsupportedTimestampType { column: String, data_type: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Upload Errors
    // ============================================================================
    #[error("Upload of '{key}' failed: {message}")]
    Upload { key: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a database (extraction) error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a timestamp parse error
    pub fn timestamp_parse(
        column: impl Into<String>,
        row: usize,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::TimestampParse {
            column: column.into(),
            row,
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create an upload error
    pub fn upload(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this error must abort the run.
    ///
    /// Upload failures are recorded and skipped; everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Upload { .. })
    }
}

/// Result type alias for table2parquet
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("MYSQL_HOST");
        assert_eq!(err.to_string(), "Missing required config field: MYSQL_HOST");

        let err = Error::timestamp_parse("created_at", 3, "yesterday", "no matching format");
        assert_eq!(
            err.to_string(),
            "Failed to parse timestamp in column 'created_at' at row 3 (yesterday): no matching format"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(!Error::upload("bucket/year=2024/month=01/day=01/data-0000.parquet", "503")
            .is_fatal());

        assert!(Error::database("connection refused").is_fatal());
        assert!(Error::missing_field("S3_BUCKET").is_fatal());
        assert!(Error::timestamp_parse("ts", 0, "x", "bad").is_fatal());
        assert!(Error::Io(std::io::Error::other("disk full")).is_fatal());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
