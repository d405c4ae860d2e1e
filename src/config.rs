//! Export configuration
//!
//! Everything the pipeline needs is resolved here before any extraction
//! starts. A missing required value is a fatal configuration error.

use crate::error::{Error, Result};
use crate::partition::DayBoundary;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Identifiers accepted for table and column names (optionally schema-qualified)
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)*$").unwrap()
});

// ============================================================================
// Top-Level Export Config
// ============================================================================

/// Complete export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Source table connection
    pub source: SourceConfig,

    /// Object store destination
    pub destination: DestinationConfig,

    /// Local directory for transient Parquet files
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Column used to bucket rows by calendar day
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,

    /// Maximum rows per extracted batch
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Calendar-day boundary for bucketing
    #[serde(default)]
    pub day_boundary: DayBoundary,

    /// Partitions exported concurrently within one batch
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,

    /// Parquet compression codec
    #[serde(default)]
    pub compression: Compression,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            destination: DestinationConfig::default(),
            working_dir: default_working_dir(),
            timestamp_column: default_timestamp_column(),
            chunk_size: default_chunk_size(),
            day_boundary: DayBoundary::default(),
            upload_concurrency: default_upload_concurrency(),
            compression: Compression::default(),
        }
    }
}

fn default_working_dir() -> PathBuf {
    PathBuf::from("parquet_files/")
}

fn default_timestamp_column() -> String {
    "created_at".to_string()
}

fn default_chunk_size() -> u64 {
    10_000
}

fn default_upload_concurrency() -> usize {
    1
}

// ============================================================================
// Source Config
// ============================================================================

/// Database engine behind the source table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseKind {
    /// MySQL / MariaDB
    #[default]
    Mysql,
    /// PostgreSQL
    Postgres,
    /// SQLite file
    Sqlite,
    /// DuckDB file
    Duckdb,
}

impl DatabaseKind {
    /// Default port for network engines
    pub fn default_port(self) -> Option<u16> {
        match self {
            Self::Mysql => Some(3306),
            Self::Postgres => Some(5432),
            Self::Sqlite | Self::Duckdb => None,
        }
    }

    /// Whether the engine is reached over the network (vs. a local file)
    pub fn is_network(self) -> bool {
        self.default_port().is_some()
    }
}

impl std::fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mysql => write!(f, "mysql"),
            Self::Postgres => write!(f, "postgres"),
            Self::Sqlite => write!(f, "sqlite"),
            Self::Duckdb => write!(f, "duckdb"),
        }
    }
}

impl std::str::FromStr for DatabaseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            "duckdb" => Ok(Self::Duckdb),
            other => Err(Error::invalid_value(
                "source.engine",
                format!("unknown database engine '{other}'"),
            )),
        }
    }
}

/// Source table connection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database engine
    #[serde(default)]
    pub engine: DatabaseKind,

    /// Full connection string (takes precedence over the components)
    #[serde(default)]
    pub connection_string: Option<String>,

    /// Host name
    #[serde(default)]
    pub host: Option<String>,

    /// Port (engine default when absent)
    #[serde(default)]
    pub port: Option<u16>,

    /// User name
    #[serde(default)]
    pub user: Option<String>,

    /// Password
    #[serde(default)]
    pub password: Option<String>,

    /// Database name, or file path for SQLite/DuckDB
    #[serde(default)]
    pub database: Option<String>,

    /// Table to export
    #[serde(default)]
    pub table: Option<String>,

    /// Optional column giving pages a deterministic order
    #[serde(default)]
    pub order_by: Option<String>,
}

// ============================================================================
// Destination Config
// ============================================================================

/// Object store destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Bucket name
    #[serde(default)]
    pub bucket: Option<String>,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Access key id
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Secret access key
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Custom endpoint (MinIO, R2, LocalStack)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Allow plain HTTP to the endpoint
    #[serde(default)]
    pub allow_http: bool,

    /// Leading key segment; defaults to the bucket name
    #[serde(default)]
    pub key_prefix: Option<String>,

    /// Destination URL overriding bucket/credentials
    /// (`s3://`, `gs://`, `az://`, `file://`, `memory://`)
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
            allow_http: false,
            key_prefix: None,
            url: None,
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl DestinationConfig {
    /// Leading segment of every object key
    pub fn key_prefix(&self) -> String {
        self.key_prefix
            .clone()
            .or_else(|| self.bucket.clone())
            .unwrap_or_default()
    }
}

/// Parquet compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    None,
}

impl std::str::FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            "gzip" => Ok(Self::Gzip),
            "none" | "uncompressed" => Ok(Self::None),
            other => Err(Error::invalid_value(
                "compression",
                format!("unknown codec '{other}'"),
            )),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl ExportConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment-style names)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let engine = get("SOURCE_ENGINE")
            .map(|v| v.parse::<DatabaseKind>())
            .transpose()?
            .unwrap_or_default();

        let source = SourceConfig {
            engine,
            connection_string: get("SOURCE_CONNECTION_STRING"),
            host: get("MYSQL_HOST"),
            port: get("MYSQL_PORT")
                .map(|v| parse_number::<u16>("MYSQL_PORT", &v))
                .transpose()?,
            user: get("MYSQL_USER"),
            password: get("MYSQL_PASSWORD"),
            database: get("MYSQL_DATABASE"),
            table: get("MYSQL_TABLE"),
            order_by: get("SOURCE_ORDER_BY"),
        };

        let destination = DestinationConfig {
            bucket: get("S3_BUCKET"),
            region: get("AWS_REGION_NAME").unwrap_or_else(default_region),
            access_key_id: get("AWS_ACCESS_KEY_ID"),
            secret_access_key: get("AWS_SECRET_ACCESS_KEY"),
            endpoint: get("S3_ENDPOINT"),
            allow_http: get("S3_ALLOW_HTTP").is_some_and(|v| v == "true" || v == "1"),
            key_prefix: lookup("S3_KEY_PREFIX"),
            url: get("DESTINATION_URL"),
        };

        let config = Self {
            source,
            destination,
            working_dir: get("LOCAL_PARQUET_DIR").map_or_else(default_working_dir, PathBuf::from),
            timestamp_column: get("TIMESTAMP_COLUMN").unwrap_or_else(default_timestamp_column),
            chunk_size: get("CHUNK_SIZE")
                .map(|v| parse_number::<u64>("CHUNK_SIZE", &v))
                .transpose()?
                .unwrap_or_else(default_chunk_size),
            day_boundary: get("DAY_BOUNDARY")
                .map(|v| v.parse::<DayBoundary>())
                .transpose()?
                .unwrap_or_default(),
            upload_concurrency: get("UPLOAD_CONCURRENCY")
                .map(|v| parse_number::<usize>("UPLOAD_CONCURRENCY", &v))
                .transpose()?
                .unwrap_or_else(default_upload_concurrency),
            compression: get("PARQUET_COMPRESSION")
                .map(|v| v.parse::<Compression>())
                .transpose()?
                .unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every required value is present and usable
    pub fn validate(&self) -> Result<()> {
        let source = &self.source;

        let table = source
            .table
            .as_deref()
            .ok_or_else(|| Error::missing_field("MYSQL_TABLE"))?;
        check_identifier("source.table", table)?;
        if let Some(order_by) = &source.order_by {
            check_identifier("source.order_by", order_by)?;
        }

        if source.connection_string.is_none() {
            if source.engine.is_network() {
                for (field, value) in [
                    ("MYSQL_HOST", &source.host),
                    ("MYSQL_USER", &source.user),
                    ("MYSQL_PASSWORD", &source.password),
                    ("MYSQL_DATABASE", &source.database),
                ] {
                    if value.is_none() {
                        return Err(Error::missing_field(field));
                    }
                }
            } else if source.database.is_none() {
                return Err(Error::missing_field("MYSQL_DATABASE"));
            }
        }

        let destination = &self.destination;
        if destination.url.is_none() {
            for (field, value) in [
                ("S3_BUCKET", &destination.bucket),
                ("AWS_ACCESS_KEY_ID", &destination.access_key_id),
                ("AWS_SECRET_ACCESS_KEY", &destination.secret_access_key),
            ] {
                if value.is_none() {
                    return Err(Error::missing_field(field));
                }
            }
        }

        if self.timestamp_column.trim().is_empty() {
            return Err(Error::missing_field("TIMESTAMP_COLUMN"));
        }
        if self.chunk_size == 0 {
            return Err(Error::invalid_value("chunk_size", "must be at least 1"));
        }
        if self.upload_concurrency == 0 {
            return Err(Error::invalid_value("upload_concurrency", "must be at least 1"));
        }

        Ok(())
    }

    /// Table name, available after validation
    pub fn table(&self) -> &str {
        self.source.table.as_deref().unwrap_or_default()
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_value(field, format!("expected a number, got '{value}'")))
}

fn check_identifier(field: &str, value: &str) -> Result<()> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(Error::invalid_value(
            field,
            format!("'{value}' is not a plain SQL identifier"),
        ))
    }
}

/// Load `.env` from the working directory or a parent; existing variables win
///
/// Returns the file that was loaded, or `None` when there is none.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) => missing_dotenv_is_ok(e),
    }
}

/// Load a specific env file; a missing file is not an error
pub fn load_dotenv_from(path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(e) => missing_dotenv_is_ok(e),
    }
}

fn missing_dotenv_is_ok(error: dotenvy::Error) -> Result<Option<PathBuf>> {
    match error {
        dotenvy::Error::Io(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        e => Err(Error::config(format!("Error loading .env: {e}"))),
    }
}
