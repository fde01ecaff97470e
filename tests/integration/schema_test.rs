//! Schema loading against real files and databases.

use std::io::Write;

use db_quill::config::{SchemaConfig, SchemaSourceKind};
use db_quill::db::{self, DatabaseClient};
use db_quill::error::QuillError;
use db_quill::schema::SchemaText;

use super::{fixture_client, fixture_db};

#[tokio::test]
async fn test_introspected_schema_lists_tables_before_indexes() {
    let (client, _dir) = fixture_client().await;

    let ddl = client.introspect_schema().await.unwrap();

    let customer = ddl.find("CREATE TABLE Customer").unwrap();
    let invoice = ddl.find("CREATE TABLE Invoice").unwrap();
    let index = ddl.find("CREATE INDEX IFK_InvoiceCustomerId").unwrap();
    assert!(customer < invoice && invoice < index);
    assert_eq!(ddl.matches(";\n\n").count(), 2);
    assert!(ddl.ends_with(';'));
}

#[tokio::test]
async fn test_load_schema_from_database_source() {
    let (config, _dir) = fixture_db().await;
    let client = db::connect(&config).await.unwrap();

    let schema_config = SchemaConfig {
        source: SchemaSourceKind::Database,
        ..SchemaConfig::default()
    };
    let schema = SchemaText::load(&schema_config, client.as_ref()).await.unwrap();

    assert!(schema.as_str().contains("REFERENCES Customer (CustomerId)"));
}

#[tokio::test]
async fn test_load_schema_from_file_source() {
    let (client, _dir) = fixture_client().await;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "CREATE TABLE Album (AlbumId INTEGER PRIMARY KEY, Title TEXT);").unwrap();

    let schema_config = SchemaConfig {
        source: SchemaSourceKind::File,
        path: file.path().to_path_buf(),
    };
    let schema = SchemaText::load(&schema_config, &client).await.unwrap();

    assert!(schema.as_str().contains("CREATE TABLE Album"));
    assert!(!schema.as_str().contains("Customer"));
}

#[tokio::test]
async fn test_missing_schema_file_is_fatal() {
    let (client, _dir) = fixture_client().await;
    let schema_config = SchemaConfig {
        source: SchemaSourceKind::File,
        path: "/definitely/not/here/schema.sql".into(),
    };

    let err = SchemaText::load(&schema_config, &client).await.unwrap_err();
    assert!(matches!(err, QuillError::Schema(_)));
}

#[tokio::test]
async fn test_missing_database_file_fails_to_connect() {
    let dir = tempfile::tempdir().unwrap();
    let config = db_quill::config::DatabaseConfig {
        path: dir.path().join("missing.sqlite"),
        ..Default::default()
    };

    let err = db::connect(&config).await.err().unwrap();
    assert!(err.to_string().contains("Database file not found"));
    assert!(!dir.path().join("missing.sqlite").exists());
}
