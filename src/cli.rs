//! Command-line argument parsing for Quill.
//!
//! Uses clap derive. CLI flags take precedence over the config file, which
//! takes precedence over environment defaults. Overrides are applied after
//! [`Config::apply_env_defaults`].

use crate::config::{Config, SchemaSourceKind};
use crate::error::{QuillError, Result};
use clap::Parser;
use std::path::PathBuf;

/// Output format for answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Answer text followed by the SQL and a results table.
    #[default]
    Text,
    /// The serialized pipeline outcome.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Ask natural-language questions about a read-only SQLite database.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Question to answer. Starts an interactive prompt when omitted.
    #[arg(value_name = "QUESTION", conflicts_with = "batch")]
    pub question: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// DDL file describing the database
    #[arg(long, value_name = "PATH", conflicts_with = "schema_from_db")]
    pub schema: Option<PathBuf>,

    /// Introspect the schema from the database instead of reading a file
    #[arg(long)]
    pub schema_from_db: bool,

    /// LLM provider: openrouter, openai, ollama or mock
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Use one model for every stage
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: OutputFormat,

    /// File with one question per line (use "-" for stdin)
    #[arg(long, value_name = "FILE")]
    pub batch: Option<String>,

    /// Questions answered concurrently in batch mode
    #[arg(long, value_name = "N", default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies CLI overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if let Some(path) = &self.db {
            config.database.path = path.clone();
        }

        if let Some(path) = &self.schema {
            config.schema.source = SchemaSourceKind::File;
            config.schema.path = path.clone();
        }
        if self.schema_from_db {
            config.schema.source = SchemaSourceKind::Database;
        }

        if let Some(provider) = &self.llm {
            let parsed: crate::llm::LlmProvider = provider.parse().map_err(QuillError::config)?;
            if parsed.as_str() != config.llm.provider {
                // A key loaded for another provider must not leak across.
                config.llm.api_key = None;
                config.llm.base_url = None;
                config.llm.provider = parsed.as_str().to_string();
                config.llm.apply_env_defaults();
            }
        }

        if let Some(model) = &self.model {
            config.llm.models = crate::config::ModelRoster::uniform(model.clone());
        }

        Ok(())
    }

    /// Batch concurrency as a usize.
    pub fn concurrency(&self) -> usize {
        usize::from(self.concurrency)
    }
}

/// Splits batch input into questions, skipping blank lines and `#` comments.
pub fn parse_batch(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
