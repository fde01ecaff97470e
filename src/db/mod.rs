//! Database abstraction layer for Quill.
//!
//! Provides a trait-based interface for the read-only database, so the
//! pipeline can run against SQLite or an in-memory mock interchangeably.

mod mock;
mod sqlite;
mod types;

pub use mock::MockDatabaseClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::DatabaseConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Opens the configured database.
///
/// This is the central factory function for database access.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn DatabaseClient>> {
    let client = SqliteClient::open(config).await?;
    Ok(Arc::new(client))
}

/// Trait defining the interface for read-only database clients.
///
/// Implementations must not hold per-question state; every call stands alone.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Returns the DDL text describing the database structure.
    async fn introspect_schema(&self) -> Result<String>;

    /// Executes a SQL query and returns the full result set.
    ///
    /// Callers are responsible for running the safety filter first.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;
}
