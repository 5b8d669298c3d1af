//! SQLite sink.
//!
//! Creates the `entries` table and inserts every completed record in a single
//! transaction: either all rows land, or none do (the table included).

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, trace};

use super::error::StoreError;
use crate::conf::ConverterConfig;
use crate::logs::Record;

/// Sink configuration
#[derive(Debug, Clone)]
pub struct SinkOptions {
    pub table: String,
    pub busy_timeout_ms: u64,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            table: "entries".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

impl From<&ConverterConfig> for SinkOptions {
    fn from(config: &ConverterConfig) -> Self {
        Self {
            table: config.table.clone(),
            busy_timeout_ms: config.busy_timeout_ms,
        }
    }
}

/// Create-only SQLite destination for records.
#[derive(Debug)]
pub struct SqliteSink {
    pool: SqlitePool,
    table: String,
}

impl SqliteSink {
    /// Open (or create) the database at `path`.
    ///
    /// Fails if the file cannot be opened or the table is already present.
    pub async fn create(path: &Path, options: &SinkOptions) -> Result<Self, StoreError> {
        check_table_name(&options.table)?;

        let connect = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_millis(options.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect)
            .await
            .map_err(|source| StoreError::Open {
                path: path.display().to_string(),
                source,
            })?;

        let sink = Self {
            pool,
            table: options.table.clone(),
        };
        sink.ensure_table_absent(&path.display().to_string()).await?;

        info!(path = %path.display(), table = %sink.table, "SQLite sink opened");
        Ok(sink)
    }

    /// Create an in-memory sink (for testing)
    pub async fn in_memory(options: &SinkOptions) -> Result<Self, StoreError> {
        check_table_name(&options.table)?;

        let open_err = |source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        };
        let connect = SqliteConnectOptions::from_str(":memory:").map_err(open_err)?;

        // A single connection that is never recycled; dropping it drops the database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect)
            .await
            .map_err(open_err)?;

        debug!("In-memory SQLite sink created");

        Ok(Self {
            pool,
            table: options.table.clone(),
        })
    }

    /// Get reference to connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn ensure_table_absent(&self, path: &str) -> Result<(), StoreError> {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(&self.table)
                .fetch_optional(&self.pool)
                .await
                .map_err(|source| StoreError::Open {
                    path: path.to_string(),
                    source,
                })?;

        if existing.is_some() {
            return Err(StoreError::TableExists {
                table: self.table.clone(),
            });
        }
        Ok(())
    }

    /// Create the table and insert `records`, all in one transaction.
    ///
    /// Returns the number of rows written. On any failure the transaction is
    /// dropped uncommitted, which also discards the table.
    pub async fn write_all(&self, records: &[Record]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Write)?;

        sqlx::query(&create_table_sql(&self.table))
            .execute(&mut *tx)
            .await
            .map_err(|source| StoreError::Create {
                table: self.table.clone(),
                source,
            })?;

        let insert = insert_sql(&self.table);
        let mut written = 0u64;
        for record in records {
            let origin = record.origin();
            let source_line = i64::try_from(record.source_line())
                .map_err(|_| StoreError::SourceLineOutOfRange(record.source_line()))?;
            sqlx::query(&insert)
                .bind(record.message())
                .bind(record.severity().code())
                .bind(origin.map(|o| o.filename.as_str()))
                .bind(origin.map(|o| i64::from(o.line)))
                .bind(record.stacktrace())
                .bind(source_line)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::Write)?;

            written += 1;
            trace!(source_line = record.source_line(), "Inserted record");
        }

        tx.commit().await.map_err(StoreError::Write)?;

        debug!(rows = written, table = %self.table, "Records committed");
        Ok(written)
    }

    /// Close the pool, flushing the database file.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Table names are spliced into SQL, so only plain identifiers are allowed.
pub(crate) fn is_table_name(table: &str) -> bool {
    let mut chars = table.chars();
    match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn check_table_name(table: &str) -> Result<(), StoreError> {
    if is_table_name(table) {
        Ok(())
    } else {
        Err(StoreError::InvalidTable(table.to_string()))
    }
}

fn create_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE "{table}" (
            message TEXT NOT NULL,
            severity INTEGER,
            filename TEXT,
            line INTEGER,
            stacktrace TEXT,
            source_line INTEGER NOT NULL
        )
        "#
    )
}

fn insert_sql(table: &str) -> String {
    format!(
        r#"
        INSERT INTO "{table}" (message, severity, filename, line, stacktrace, source_line)
        VALUES (?, ?, ?, ?, ?, ?)
        "#
    )
}
