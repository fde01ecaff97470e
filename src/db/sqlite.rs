//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient`
//! trait using sqlx. Each query opens its own read-only connection and
//! closes it once the rows are fetched.

use crate::config::DatabaseConfig;
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{QuillError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{
    Column as SqlxColumn, ConnectOptions, Connection, Executor, Row as SqlxRow, Statement,
    TypeInfo, ValueRef,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long SQLite waits on a locked database file before giving up.
const BUSY_TIMEOUT_SECS: u64 = 5;

/// DDL for every user object, tables first, then views, indexes and triggers.
const SCHEMA_QUERY: &str = r#"
    SELECT sql
    FROM sqlite_master
    WHERE sql IS NOT NULL
        AND name NOT LIKE 'sqlite_%'
    ORDER BY
        CASE type WHEN 'table' THEN 0 WHEN 'view' THEN 1 WHEN 'index' THEN 2 ELSE 3 END,
        rowid
"#;

/// Read-only SQLite client.
#[derive(Debug, Clone)]
pub struct SqliteClient {
    options: SqliteConnectOptions,
    path: PathBuf,
    query_timeout: Duration,
}

impl SqliteClient {
    /// Opens the database described by `config`.
    ///
    /// The file must already exist; a probe connection is opened and closed
    /// so that a bad path fails at startup instead of on the first question.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        if !config.path.exists() {
            return Err(QuillError::config(format!(
                "Database file not found: {}",
                config.path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .read_only(true)
            .create_if_missing(false)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

        let client = Self {
            options,
            path: config.path.clone(),
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        };

        let probe = client.acquire().await?;
        probe
            .close()
            .await
            .map_err(|e| QuillError::query(format!("Failed to close probe connection: {e}")))?;

        debug!(path = %client.path.display(), "Opened database read-only");
        Ok(client)
    }

    /// Opens a fresh read-only connection.
    async fn acquire(&self) -> Result<SqliteConnection> {
        self.options.connect().await.map_err(|e| {
            QuillError::query(format!(
                "Failed to open database {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Acquires a connection, runs `sql` and releases the connection.
    async fn run(&self, sql: &str) -> Result<QueryResult> {
        let mut conn = self.acquire().await?;
        let result = fetch(&mut conn, sql).await;

        if let Err(e) = conn.close().await {
            warn!("Failed to close database connection: {}", e);
        }

        result
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn introspect_schema(&self) -> Result<String> {
        let mut conn = self.acquire().await?;
        let statements: Vec<String> = sqlx::query_scalar(SCHEMA_QUERY)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| QuillError::schema(format!("Failed to read sqlite_master: {e}")))?;

        if let Err(e) = conn.close().await {
            warn!("Failed to close database connection: {}", e);
        }

        debug!(object_count = statements.len(), "Introspected schema");

        Ok(statements
            .iter()
            .map(|s| format!("{};", s.trim().trim_end_matches(';')))
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(self.query_timeout, self.run(sql))
            .await
            .map_err(|_| {
                QuillError::query(format!(
                    "Query timed out after {} seconds",
                    self.query_timeout.as_secs()
                ))
            })??;

        let execution_time = start.elapsed();
        debug!(
            rows = result.row_count(),
            duration_ms = execution_time.as_millis(),
            "Query executed"
        );

        Ok(result.with_execution_time(execution_time))
    }
}

/// Prepares `sql` to learn its projection, then fetches every row.
async fn fetch(conn: &mut SqliteConnection, sql: &str) -> Result<QueryResult> {
    let statement = (&mut *conn)
        .prepare(sql)
        .await
        .map_err(|e| QuillError::query(format_query_error(e)))?;

    let columns: Vec<ColumnInfo> = statement
        .columns()
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect();

    let rows = statement
        .query()
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| QuillError::query(format_query_error(e)))?;

    Ok(QueryResult::with_data(
        columns,
        rows.iter().map(convert_row).collect(),
    ))
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a single value using its runtime storage class.
///
/// SQLite is dynamically typed, so the declared column type is ignored.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    let value = match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "INT8" => {
            row.try_get_unchecked::<i64, _>(index).map(Value::Int)
        }
        "REAL" | "FLOAT" | "DOUBLE" => row.try_get_unchecked::<f64, _>(index).map(Value::Float),
        "BOOLEAN" => row.try_get_unchecked::<bool, _>(index).map(Value::Bool),
        "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(index).map(Value::Bytes),
        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(Value::String),
    };

    value.unwrap_or(Value::Null)
}

/// Extracts the database's own message where available.
fn format_query_error(error: sqlx::Error) -> String {
    match error {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}
