//! Quill - natural-language questions over a read-only SQLite database.
//!
//! Every question runs through a staged pipeline: a guardrail, a
//! META/DATA classifier, then either a schema-only answer or SQL
//! generation behind a safety filter, read-only execution and answer
//! synthesis. This library exposes the modules the `quill` binary and
//! the integration tests build on.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod query;
pub mod safety;
pub mod schema;
