//! Response parsing for LLM outputs.
//!
//! Turns raw completions into the small vocabulary each stage acts on:
//! a guard verdict, a META/DATA label, or a single SQL statement.

use regex::Regex;
use std::sync::LazyLock;

/// Shortest `SELECT ... ;` span, case-insensitive and across newlines.
static SELECT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)(SELECT.*?;)").expect("SELECT pattern is a valid regex"));

/// Extracts the SQL statement from a generation response.
///
/// Returns the first `SELECT ... ;` substring. When there is none, falls
/// back to the first line of the raw output; the safety filter decides
/// whether that is runnable.
pub fn extract_sql(response: &str) -> String {
    if let Some(found) = SELECT_PATTERN.find(response) {
        return found.as_str().trim().to_string();
    }

    response
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// True when the guard response is exactly `VALID`, ignoring case and
/// surrounding whitespace. Anything else is a rejection.
pub fn is_valid_verdict(response: &str) -> bool {
    response.trim().eq_ignore_ascii_case("VALID")
}

/// True when the classifier response mentions `META`. Everything else,
/// including garbage, routes to DATA.
pub fn is_meta(response: &str) -> bool {
    response.to_uppercase().contains("META")
}
