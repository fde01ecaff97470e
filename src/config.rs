//! Configuration management for Quill.
//!
//! Handles loading configuration from TOML files and environment variables:
//! language-model provider settings, the four per-stage model identifiers,
//! the database location and the schema source.

use crate::error::{QuillError, Result};
use crate::llm::LlmProvider;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure for Quill.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Database to answer questions about.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Where the schema text comes from.
    #[serde(default)]
    pub schema: SchemaConfig,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "openrouter", "openai", "ollama" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Overrides the provider's default API endpoint.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key (prefer the environment over storing it here).
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature. Zero keeps routing decisions stable.
    #[serde(default)]
    pub temperature: f32,

    /// Maximum completion tokens per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout for a single gateway call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Model identifiers per pipeline stage.
    #[serde(default)]
    pub models: ModelRoster,
}

fn default_provider() -> String {
    "openrouter".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            api_key: None,
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            models: ModelRoster::default(),
        }
    }
}

impl LlmConfig {
    /// Parses the configured provider name.
    pub fn provider(&self) -> Result<LlmProvider> {
        self.provider.parse().map_err(QuillError::config)
    }

    /// Validates and returns the configured base URL, if any.
    pub fn base_url(&self) -> Result<Option<Url>> {
        self.base_url
            .as_deref()
            .map(|raw| {
                let url = Url::parse(raw)
                    .map_err(|e| QuillError::config(format!("Invalid base_url '{raw}': {e}")))?;
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(QuillError::config(format!(
                        "Invalid base_url scheme '{}'. Expected 'http' or 'https'",
                        url.scheme()
                    )));
                }
                Ok(url)
            })
            .transpose()
    }

    /// Fills in the API key from the provider's environment variable when unset.
    pub fn apply_env_defaults(&mut self) {
        self.apply_env_defaults_with(|var| std::env::var(var).ok());
    }

    /// Like [`apply_env_defaults`](Self::apply_env_defaults), reading variables through `lookup`.
    pub fn apply_env_defaults_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_some() {
            return;
        }
        if let Ok(provider) = self.provider() {
            if let Some(var) = provider.api_key_env() {
                self.api_key = lookup(var).filter(|k| !k.trim().is_empty());
            }
        }
    }

    /// Fails when a remote provider has no API key.
    pub fn require_api_key(&self) -> Result<()> {
        let provider = self.provider()?;
        match (provider.api_key_env(), &self.api_key) {
            (Some(var), None) => Err(QuillError::config(format!(
                "No API key configured for {provider}. Set {var} or llm.api_key."
            ))),
            _ => Ok(()),
        }
    }
}

/// Model identifiers for the four pipeline stages.
///
/// They may all name the same backing model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRoster {
    /// Topicality/safety guardrail.
    #[serde(default = "default_guard_model")]
    pub guard: String,

    /// Meta-vs-data classifier.
    #[serde(default = "default_classify_model")]
    pub classify: String,

    /// SQL generation.
    #[serde(default = "default_sql_model")]
    pub sql: String,

    /// Answer synthesis, for both branches.
    #[serde(default = "default_answer_model")]
    pub answer: String,
}

fn default_guard_model() -> String {
    "google/gemma-3n-e4b-it:free".to_string()
}

fn default_classify_model() -> String {
    "google/gemini-2.5-flash-lite-preview-09-2025".to_string()
}

fn default_sql_model() -> String {
    "google/gemini-2.5-flash-lite-preview-09-2025".to_string()
}

fn default_answer_model() -> String {
    "google/gemma-3n-e4b-it:free".to_string()
}

impl Default for ModelRoster {
    fn default() -> Self {
        Self {
            guard: default_guard_model(),
            classify: default_classify_model(),
            sql: default_sql_model(),
            answer: default_answer_model(),
        }
    }
}

impl ModelRoster {
    /// Uses one model for every stage.
    pub fn uniform(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            guard: model.clone(),
            classify: model.clone(),
            sql: model.clone(),
            answer: model,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// What the database holds, named in the guardrail prompt.
    #[serde(default = "default_description")]
    pub description: String,

    /// Timeout for a single query, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub query_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("Chinook_Sqlite.sqlite")
}

fn default_description() -> String {
    "the Chinook music store database".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            description: default_description(),
            query_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where the schema text is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaSourceKind {
    /// A DDL file on disk.
    #[default]
    File,
    /// DDL introspected from the database itself.
    Database,
}

/// Schema provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Schema source.
    #[serde(default)]
    pub source: SchemaSourceKind,

    /// DDL file path, used when `source = "file"`.
    #[serde(default = "default_schema_path")]
    pub path: PathBuf,
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schema.sql")
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            source: SchemaSourceKind::default(),
            path: default_schema_path(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("db-quill")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| QuillError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            QuillError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies environment variables as defaults for unset values.
    ///
    /// Runs before CLI overrides. `QUILL_DB_PATH` and `QUILL_SCHEMA_PATH`
    /// only apply while the corresponding path is still the built-in default.
    pub fn apply_env_defaults(&mut self) {
        self.apply_env_defaults_with(|var| std::env::var(var).ok());
    }

    /// Like [`apply_env_defaults`](Self::apply_env_defaults), reading variables through `lookup`.
    pub fn apply_env_defaults_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.llm.apply_env_defaults_with(&lookup);

        let env_path = |var: &str| lookup(var).filter(|p| !p.trim().is_empty()).map(PathBuf::from);
        if self.database.path == default_db_path() {
            if let Some(path) = env_path("QUILL_DB_PATH") {
                self.database.path = path;
            }
        }
        if self.schema.path == default_schema_path() {
            if let Some(path) = env_path("QUILL_SCHEMA_PATH") {
                self.schema.path = path;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
[llm]
provider = "openai"
base_url = "https://llm.internal.example.com/v1"
temperature = 0.0
max_tokens = 256
timeout_secs = 10

[llm.models]
guard = "gpt-4o-mini"
classify = "gpt-4o-mini"
sql = "gpt-4o"
answer = "gpt-4o-mini"

[database]
path = "/data/chinook.sqlite"
description = "a music store"
query_timeout_secs = 5

[schema]
source = "database"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.llm.provider().unwrap(), LlmProvider::OpenAi);
        assert_eq!(config.llm.max_tokens, 256);
        assert_eq!(config.llm.timeout_secs, 10);
        assert_eq!(config.llm.models.sql, "gpt-4o");
        assert_eq!(config.llm.models.guard, "gpt-4o-mini");
        assert_eq!(config.database.path, PathBuf::from("/data/chinook.sqlite"));
        assert_eq!(config.database.query_timeout_secs, 5);
        assert_eq!(config.schema.source, SchemaSourceKind::Database);
        assert_eq!(config.schema.path, PathBuf::from("schema.sql"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider().unwrap(), LlmProvider::OpenRouter);
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.database.path, PathBuf::from("Chinook_Sqlite.sqlite"));
        assert_eq!(config.schema.source, SchemaSourceKind::File);
    }

    #[test]
    fn test_partial_models_fall_back_per_field() {
        let toml = r#"
[llm.models]
sql = "my-sql-model"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.llm.models.sql, "my-sql-model");
        assert_eq!(config.llm.models.guard, default_guard_model());
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let config = LlmConfig {
            provider: "watson".to_string(),
            ..LlmConfig::default()
        };
        let err = config.provider().unwrap_err();
        assert!(matches!(err, QuillError::Config(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = LlmConfig {
            base_url: Some("ftp://example.com".to_string()),
            ..LlmConfig::default()
        };
        assert!(config.base_url().is_err());

        let config = LlmConfig {
            base_url: Some("not a url".to_string()),
            ..LlmConfig::default()
        };
        assert!(config.base_url().is_err());
    }

    #[test]
    fn test_require_api_key() {
        let config = LlmConfig {
            provider: "openrouter".to_string(),
            api_key: None,
            ..LlmConfig::default()
        };
        let err = config.require_api_key().unwrap_err();
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));

        let config = LlmConfig {
            provider: "mock".to_string(),
            api_key: None,
            ..LlmConfig::default()
        };
        assert!(config.require_api_key().is_ok());

        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        assert!(config.require_api_key().is_ok());
    }

    fn fake_env(var: &str) -> Option<String> {
        match var {
            "OPENROUTER_API_KEY" => Some("sk-or-env".to_string()),
            "QUILL_DB_PATH" => Some("/env/chinook.sqlite".to_string()),
            "QUILL_SCHEMA_PATH" => Some("  ".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_env_fills_unset_values() {
        let mut config = Config::default();
        config.apply_env_defaults_with(fake_env);

        assert_eq!(config.llm.api_key.as_deref(), Some("sk-or-env"));
        assert_eq!(config.database.path, PathBuf::from("/env/chinook.sqlite"));
        assert_eq!(config.schema.path, PathBuf::from("schema.sql"));
    }

    #[test]
    fn test_env_does_not_replace_file_values() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-or-file".to_string());
        config.database.path = PathBuf::from("/srv/music.sqlite");
        config.apply_env_defaults_with(fake_env);

        assert_eq!(config.llm.api_key.as_deref(), Some("sk-or-file"));
        assert_eq!(config.database.path, PathBuf::from("/srv/music.sqlite"));
    }

    #[test]
    fn test_uniform_roster() {
        let roster = ModelRoster::uniform("llama3.2:3b");
        assert_eq!(roster.guard, "llama3.2:3b");
        assert_eq!(roster.answer, "llama3.2:3b");
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.llm.max_tokens, 500);
    }

    #[test]
    fn test_load_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm\nprovider = 1").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
