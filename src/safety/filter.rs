//! Prefix and denylist checks for generated SQL.
//!
//! The denylist is matched as a plain substring over the upper-cased text,
//! so keywords inside string literals, comments or identifiers such as
//! `update_count` are refused too. Over-blocking is accepted; no parser
//! is involved.

use crate::error::{QuillError, Result};

use super::Rejection;

/// Keywords that must never appear anywhere in an executed statement.
pub const UNSAFE_KEYWORDS: [&str; 6] = ["DROP", "DELETE", "INSERT", "UPDATE", "ATTACH", "PRAGMA"];

/// Required leading keyword, followed by at least one whitespace character.
const SELECT_PREFIX: &str = "SELECT";

/// Stateless SQL filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlFilter;

impl SqlFilter {
    /// Creates a new filter.
    pub fn new() -> Self {
        Self
    }

    /// Inspects `sql` and returns the first reason it must be refused, if any.
    pub fn inspect(&self, sql: &str) -> Option<Rejection> {
        if !starts_with_select(sql) {
            return Some(Rejection::NotSelect);
        }

        let upper = sql.to_uppercase();
        UNSAFE_KEYWORDS
            .iter()
            .find(|keyword| upper.contains(*keyword))
            .map(|keyword| Rejection::Denylisted(*keyword))
    }

    /// Returns `Ok(())` when `sql` may be executed, `UnsafeSql` otherwise.
    pub fn check(&self, sql: &str) -> Result<()> {
        match self.inspect(sql) {
            None => Ok(()),
            Some(rejection) => {
                tracing::warn!(%rejection, sql_len = sql.len(), "SQL refused by safety filter");
                Err(QuillError::unsafe_sql(rejection.to_string()))
            }
        }
    }
}

fn starts_with_select(sql: &str) -> bool {
    let sql = sql.trim_start();
    let (Some(head), Some(rest)) = (sql.get(..SELECT_PREFIX.len()), sql.get(SELECT_PREFIX.len()..))
    else {
        return false;
    };
    head.eq_ignore_ascii_case(SELECT_PREFIX) && rest.starts_with(char::is_whitespace)
}
