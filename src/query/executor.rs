//! Query execution behind the safety filter.
//!
//! The executor is the only path from generated SQL to the database, and it
//! runs the filter itself, so a statement cannot reach the database unchecked.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::db::{DatabaseClient, QueryResult};
use crate::error::{QuillError, Result};
use crate::safety::SqlFilter;

/// Query executor that gates SQL and runs it read-only.
#[derive(Clone)]
pub struct QueryExecutor {
    db: Arc<dyn DatabaseClient>,
    filter: SqlFilter,
}

impl QueryExecutor {
    /// Creates a new query executor over `db`.
    pub fn new(db: Arc<dyn DatabaseClient>) -> Self {
        Self {
            db,
            filter: SqlFilter::new(),
        }
    }

    /// Checks `sql` against the filter, then executes it.
    ///
    /// Rejected statements return [`QuillError::UnsafeSql`] without touching
    /// the database. Database failures return [`QuillError::Query`].
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.filter.check(sql)?;

        let start = Instant::now();
        let result = self.db.execute_query(sql).await.map_err(|e| match e {
            QuillError::Query(_) => e,
            other => QuillError::query(other.to_string()),
        })?;
        let execution_time = start.elapsed();

        info!(
            rows = result.row_count(),
            elapsed_ms = execution_time.as_millis() as u64,
            "Query executed"
        );
        debug!(sql, "Executed statement");

        Ok(result.with_execution_time(execution_time))
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}
