//! Mock database client for testing.
//!
//! Returns canned result sets and records every statement it is asked to run.

use super::{ColumnInfo, DatabaseClient, QueryResult, Value};
use crate::error::{QuillError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// Canned outcome for statements containing a pattern.
#[derive(Debug, Clone)]
enum Canned {
    Rows(QueryResult),
    Error(String),
}

/// A mock database client that returns predefined results.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    schema: String,
    responses: Vec<(String, Canned)>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock with an empty schema and no canned results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the DDL returned by `introspect_schema`.
    pub fn with_schema(mut self, ddl: impl Into<String>) -> Self {
        self.schema = ddl.into();
        self
    }

    /// Returns `result` for statements containing `pattern` (case-insensitive).
    pub fn with_result(mut self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.responses.push((pattern.into(), Canned::Rows(result)));
        self
    }

    /// Fails statements containing `pattern` with a query error.
    pub fn with_error(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .push((pattern.into(), Canned::Error(message.into())));
        self
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of statements executed so far.
    pub fn call_count(&self) -> usize {
        self.executed().len()
    }

    fn default_result(sql: &str) -> QueryResult {
        QueryResult::with_data(
            vec![ColumnInfo::new("result", "TEXT")],
            vec![vec![Value::String(format!("Mock result for: {}", sql))]],
        )
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<String> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        let sql_lower = sql.to_lowercase();
        let canned = self
            .responses
            .iter()
            .find(|(pattern, _)| sql_lower.contains(&pattern.to_lowercase()))
            .map(|(_, canned)| canned.clone());

        match canned {
            Some(Canned::Rows(result)) => Ok(result),
            Some(Canned::Error(message)) => Err(QuillError::query(message)),
            None => Ok(Self::default_result(sql)),
        }
    }
}
