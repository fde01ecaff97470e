//! SQL safety filter.
//!
//! Gates every generated statement before it can reach the database: only
//! statements that start with `SELECT` and mention none of the denylisted
//! keywords are allowed through.

mod filter;

pub use filter::{SqlFilter, UNSAFE_KEYWORDS};

use std::fmt;

/// Reason a statement was refused by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The statement does not begin with `SELECT`.
    NotSelect,
    /// The statement mentions a denylisted keyword somewhere in its text.
    Denylisted(&'static str),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSelect => write!(f, "only SELECT statements are allowed"),
            Self::Denylisted(keyword) => write!(f, "statement contains {}", keyword),
        }
    }
}
