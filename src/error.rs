//! Error types for Quill.
//!
//! Defines the main error enum used throughout the pipeline.

use thiserror::Error;

/// Main error type for Quill operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuillError {
    /// The guardrail judged the question off-topic or unsafe.
    #[error("Rejected: {0}")]
    GuardrailRejected(String),

    /// A generated statement failed the SQL safety filter.
    #[error("Unsafe SQL rejected: {0}")]
    UnsafeSql(String),

    /// Query execution errors (syntax errors, unknown tables, timeouts, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// LLM gateway errors (network, non-2xx, timeouts, empty completions)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Schema could not be loaded at startup.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration errors (invalid config file, missing API key, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QuillError {
    /// Creates a guardrail rejection with the given message.
    pub fn guardrail(msg: impl Into<String>) -> Self {
        Self::GuardrailRejected(msg.into())
    }

    /// Creates an unsafe-SQL rejection with the given message.
    pub fn unsafe_sql(msg: impl Into<String>) -> Self {
        Self::UnsafeSql(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a schema load error with the given message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::GuardrailRejected(_) => "Guardrail Rejected",
            Self::UnsafeSql(_) => "Unsafe SQL Rejected",
            Self::Query(_) => "Execution Error",
            Self::Llm(_) => "Gateway Error",
            Self::Schema(_) => "Schema Load Error",
            Self::Config(_) => "Configuration Error",
        }
    }

    /// Returns true for expected, user-facing rejections (as opposed to failures).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::GuardrailRejected(_) | Self::UnsafeSql(_))
    }
}

/// Result type alias using QuillError.
pub type Result<T> = std::result::Result<T, QuillError>;
