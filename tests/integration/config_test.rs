//! Configuration file loading combined with CLI overrides.

use std::io::Write;

use clap::Parser;
use db_quill::cli::Cli;
use db_quill::config::{Config, SchemaSourceKind};
use db_quill::llm::{create_client, LlmProvider};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_cli_overrides_config_file() {
    let file = write_config(
        r#"
[llm]
provider = "openrouter"
api_key = "sk-or-from-file"

[llm.models]
sql = "google/gemini-2.5-flash"

[database]
path = "/srv/chinook.sqlite"

[schema]
source = "file"
path = "/srv/chinook.sql"
"#,
    );

    let mut config = Config::load_from_file(file.path()).unwrap();
    assert_eq!(config.llm.models.sql, "google/gemini-2.5-flash");

    let cli = Cli::try_parse_from([
        "quill",
        "--llm",
        "mock",
        "--db",
        "/tmp/other.sqlite",
        "--schema-from-db",
        "How many tracks?",
    ])
    .unwrap();
    cli.apply_overrides(&mut config).unwrap();

    assert_eq!(config.llm.provider().unwrap(), LlmProvider::Mock);
    assert_eq!(config.llm.api_key, None);
    assert_eq!(config.database.path.to_str(), Some("/tmp/other.sqlite"));
    assert_eq!(config.schema.source, SchemaSourceKind::Database);
    assert!(config.llm.require_api_key().is_ok());
    assert!(create_client(&config.llm).is_ok());
}

#[test]
fn test_file_values_survive_without_flags() {
    let file = write_config(
        r#"
[llm]
provider = "ollama"
timeout_secs = 90

[database]
description = "a vinyl shop inventory"
"#,
    );

    let mut config = Config::load_from_file(file.path()).unwrap();
    let cli = Cli::try_parse_from(["quill", "q"]).unwrap();
    cli.apply_overrides(&mut config).unwrap();

    assert_eq!(config.llm.provider().unwrap(), LlmProvider::Ollama);
    assert_eq!(config.llm.timeout_secs, 90);
    assert_eq!(config.database.description, "a vinyl shop inventory");
}

#[test]
fn test_invalid_config_reports_path() {
    let file = write_config("[llm\nprovider = ");
    let err = Config::load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains(&file.path().display().to_string()));
}
