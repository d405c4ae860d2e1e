//! DuckDB-based source query engine
//!
//! Provides read-only access to MySQL, PostgreSQL, SQLite and DuckDB tables
//! via DuckDB extensions. Pages come back as Arrow RecordBatches.

use crate::config::{DatabaseKind, SourceConfig};
use crate::error::{Error, Result};
use crate::pagination::BatchSource;
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use duckdb::Connection;

/// Source database engine using DuckDB
pub struct DatabaseEngine {
    /// DuckDB connection
    conn: Connection,
    /// Database type
    db_type: DatabaseKind,
    /// Connection string used (for logging)
    connection_string: String,
}

impl DatabaseEngine {
    /// Open an in-memory DuckDB and attach the source database read-only
    pub fn new(source: &SourceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to create DuckDB connection: {e}")))?;

        let connection_string = Self::build_connection_string(source)?;

        let engine = Self {
            conn,
            db_type: source.engine,
            connection_string,
        };

        engine.attach_database()?;
        tracing::debug!("Attached source database {}", engine.connection_info());

        Ok(engine)
    }

    /// Build connection string from config
    fn build_connection_string(source: &SourceConfig) -> Result<String> {
        if let Some(ref conn_str) = source.connection_string {
            return Ok(conn_str.clone());
        }

        let database = source
            .database
            .clone()
            .ok_or_else(|| Error::missing_field("MYSQL_DATABASE"))?;

        match source.engine {
            DatabaseKind::Mysql | DatabaseKind::Postgres => {
                let host = source.host.as_deref().unwrap_or("localhost");
                let user = source.user.as_deref().unwrap_or_default();
                let password = source.password.as_deref().unwrap_or_default();
                let port = source
                    .port
                    .or_else(|| source.engine.default_port())
                    .unwrap_or_default();

                if source.engine == DatabaseKind::Mysql {
                    Ok(format!(
                        "host={host} port={port} user={user} password={password} database={database}"
                    ))
                } else {
                    Ok(format!(
                        "postgresql://{user}:{password}@{host}:{port}/{database}"
                    ))
                }
            }
            // File engines use the database as a path
            DatabaseKind::Sqlite | DatabaseKind::Duckdb => Ok(database),
        }
    }

    /// Attach the source database to DuckDB as `source_db`
    fn attach_database(&self) -> Result<()> {
        let connection_string = self.connection_string.replace('\'', "''");
        let (extension, attach_sql) = match self.db_type {
            DatabaseKind::Postgres => (
                Some("postgres"),
                format!("ATTACH '{connection_string}' AS source_db (TYPE POSTGRES, READ_ONLY);"),
            ),
            DatabaseKind::Mysql => (
                Some("mysql"),
                format!("ATTACH '{connection_string}' AS source_db (TYPE MYSQL, READ_ONLY);"),
            ),
            DatabaseKind::Sqlite => (
                Some("sqlite"),
                format!("ATTACH '{connection_string}' AS source_db (TYPE SQLITE, READ_ONLY);"),
            ),
            DatabaseKind::Duckdb => (
                None,
                format!("ATTACH '{connection_string}' AS source_db (READ_ONLY);"),
            ),
        };

        if let Some(extension) = extension {
            self.conn
                .execute_batch(&format!("INSTALL {extension}; LOAD {extension};"))
                .map_err(|e| {
                    Error::database(format!("Failed to load {extension} extension: {e}"))
                })?;
        }

        self.conn
            .execute_batch(&attach_sql)
            .map_err(|e| Error::database(format!("Failed to attach {}: {e}", self.connection_info())))?;

        Ok(())
    }

    /// Test database connection
    pub fn check_connection(&self) -> Result<()> {
        let query = match self.db_type {
            DatabaseKind::Postgres => "SELECT 1 FROM source_db.pg_catalog.pg_tables LIMIT 1",
            DatabaseKind::Mysql => "SELECT 1 FROM source_db.information_schema.tables LIMIT 1",
            DatabaseKind::Sqlite => "SELECT 1 FROM source_db.sqlite_master LIMIT 1",
            DatabaseKind::Duckdb => "SELECT 1",
        };

        self.conn
            .execute(query, [])
            .map_err(|e| Error::database(format!("Connection check failed: {e}")))?;

        Ok(())
    }

    /// Get list of tables in the attached database
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let query = "SELECT schema_name || '.' || table_name AS full_name
                     FROM duckdb_tables()
                     WHERE database_name = 'source_db'
                     ORDER BY schema_name, table_name";

        let mut stmt = self
            .conn
            .prepare(query)
            .map_err(|e| Error::database(format!("Failed to prepare query: {e}")))?;

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| Error::database(format!("Failed to query tables: {e}")))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(tables)
    }

    /// Fetch one page of a table
    ///
    /// At most `limit` rows starting at `offset`. The schema is kept even
    /// when the page is empty.
    pub fn fetch_page(
        &self,
        table: &str,
        order_by: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> Result<RecordBatch> {
        let query = build_page_query(table, order_by, offset, limit);

        tracing::debug!("Executing query: {}", query);

        let mut stmt = self
            .conn
            .prepare(&query)
            .map_err(|e| Error::database(format!("Failed to prepare page query: {e}")))?;

        let arrow = stmt
            .query_arrow([])
            .map_err(|e| Error::database(format!("Failed to fetch page at offset {offset}: {e}")))?;
        let schema = arrow.get_schema();
        let batches: Vec<RecordBatch> = arrow.collect();

        Ok(concat_batches(&schema, &batches)?)
    }

    /// Get database type
    pub fn db_type(&self) -> DatabaseKind {
        self.db_type
    }

    /// Get connection string (for logging - password masked)
    pub fn connection_info(&self) -> String {
        mask_password(&self.connection_string)
    }
}

/// Build the paging query; no ORDER BY unless a column is given
pub(crate) fn build_page_query(
    table: &str,
    order_by: Option<&str>,
    offset: u64,
    limit: u64,
) -> String {
    let mut query = format!("SELECT * FROM source_db.{table}");
    if let Some(column) = order_by {
        query = format!("{query} ORDER BY {column}");
    }
    format!("{query} LIMIT {limit} OFFSET {offset}")
}

/// Mask the password in URL-style and key=value connection strings
fn mask_password(connection_string: &str) -> String {
    if let Some(start) = connection_string.find("password=") {
        let value_start = start + "password=".len();
        let value_end = connection_string[value_start..]
            .find(' ')
            .map_or(connection_string.len(), |i| value_start + i);
        return format!(
            "{}****{}",
            &connection_string[..value_start],
            &connection_string[value_end..]
        );
    }

    if let Some(at_pos) = connection_string.find('@') {
        if let Some(colon_pos) = connection_string[..at_pos].rfind(':') {
            if connection_string[..colon_pos].contains("://") {
                let before_pass = &connection_string[..=colon_pos];
                let after_at = &connection_string[at_pos..];
                return format!("{before_pass}****{after_at}");
            }
        }
    }

    connection_string.to_string()
}

/// One table of an attached database, read page by page
pub struct TableSource {
    engine: DatabaseEngine,
    table: String,
    order_by: Option<String>,
}

impl TableSource {
    /// Create a source over `table`
    pub fn new(engine: DatabaseEngine, table: impl Into<String>, order_by: Option<String>) -> Self {
        Self {
            engine,
            table: table.into(),
            order_by,
        }
    }

    /// Open the engine described by `source` and wrap its configured table
    pub fn open(source: &SourceConfig) -> Result<Self> {
        let table = source
            .table
            .clone()
            .ok_or_else(|| Error::missing_field("MYSQL_TABLE"))?;
        let engine = DatabaseEngine::new(source)?;
        Ok(Self::new(engine, table, source.order_by.clone()))
    }

    /// Underlying engine
    pub fn engine(&self) -> &DatabaseEngine {
        &self.engine
    }
}

impl BatchSource for TableSource {
    fn fetch(&mut self, offset: u64, limit: u64) -> Result<RecordBatch> {
        self.engine
            .fetch_page(&self.table, self.order_by.as_deref(), offset, limit)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.table, self.engine.connection_info())
    }
}
