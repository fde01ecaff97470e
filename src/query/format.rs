//! Tab-separated rendering of result sets.
//!
//! This is the exact text handed to the answer-synthesis model, so it is
//! pure and deterministic.

use crate::db::QueryResult;

/// Placeholder sent in place of an empty result set.
pub const NO_RESULTS: &str = "(no results)";

/// Formats a result set as a header line plus one line per row.
///
/// Column names and values are joined by tabs, lines by `\n`, with no
/// trailing newline. A result with no rows formats to [`NO_RESULTS`].
pub fn format_tsv(result: &QueryResult) -> String {
    if result.rows.is_empty() {
        return NO_RESULTS.to_string();
    }

    let header = result.column_names().collect::<Vec<_>>().join("\t");
    let lines = result.rows.iter().map(|row| {
        row.iter()
            .map(|value| value.to_display_string())
            .collect::<Vec<_>>()
            .join("\t")
    });

    std::iter::once(header)
        .chain(lines)
        .collect::<Vec<_>>()
        .join("\n")
}
