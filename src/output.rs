//! Rendering of pipeline outcomes for the terminal.
//!
//! Provides two output formats: human-readable text and JSON.

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::db::QueryResult;
use crate::pipeline::PipelineOutcome;

/// Longest cell rendered in text tables before truncation.
const MAX_CELL_WIDTH: usize = 40;

/// One answered question, as emitted in JSON output.
#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    question: &'a str,
    #[serde(flatten)]
    outcome: &'a PipelineOutcome,
}

/// Formats pipeline outcomes.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeOutput {
    format: OutputFormat,
}

impl OutcomeOutput {
    /// Creates a new output formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the outcome for `question` according to the configured format.
    ///
    /// JSON is pretty-printed for single questions and compact (one line
    /// per question) when `compact` is set, for batch output.
    pub fn format(&self, question: &str, outcome: &PipelineOutcome, compact: bool) -> String {
        match self.format {
            OutputFormat::Text => format_text(outcome),
            OutputFormat::Json => format_json(question, outcome, compact),
        }
    }
}

fn format_json(question: &str, outcome: &PipelineOutcome, compact: bool) -> String {
    let output = JsonOutput { question, outcome };
    let rendered = if compact {
        serde_json::to_string(&output)
    } else {
        serde_json::to_string_pretty(&output)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
}

fn format_text(outcome: &PipelineOutcome) -> String {
    match outcome {
        PipelineOutcome::Rejected => {
            "Rejected: the question is off-topic or unsafe for this database.\n".to_string()
        }
        PipelineOutcome::MetaAnswer { text } => {
            format!("{}\n\nAnswer source: schema (no SQL executed)\n", text)
        }
        PipelineOutcome::DataAnswer { text, sql, results } => {
            let rows = results.row_count();
            format!(
                "{}\n\nSQL:\n{}\n\n{}({} {} in {}ms)\n",
                text,
                sql,
                render_table(results),
                rows,
                if rows == 1 { "row" } else { "rows" },
                results.execution_time.as_millis()
            )
        }
        PipelineOutcome::Failed { error } => format!("{}: {}\n", error.category(), error),
    }
}

/// Renders a result set as an aligned plain-text table.
pub fn render_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return String::new();
    }

    let header: Vec<String> = result.column_names().map(truncate).collect();
    let body: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| truncate(&v.to_display_string())).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let render_line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut out = String::new();
    out.push_str(&render_line(&header));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in &body {
        out.push_str(&render_line(row));
        out.push('\n');
    }
    out
}

fn truncate(cell: &str) -> String {
    let cell = cell.replace(['\n', '\t'], " ");
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell;
    }
    let kept: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
    format!("{}...", kept)
}
