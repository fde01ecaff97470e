//! Query execution and result formatting for Quill.
//!
//! Isolates the gated SQL execution path and the tab-separated rendering
//! of result sets from the pipeline.

pub mod executor;
pub mod format;

pub use executor::QueryExecutor;
pub use format::{format_tsv, NO_RESULTS};
