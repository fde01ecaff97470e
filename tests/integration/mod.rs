//! Integration tests for Quill.

pub mod config_test;
pub mod pipeline_test;
pub mod schema_test;

use db_quill::config::DatabaseConfig;
use db_quill::db::SqliteClient;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tempfile::TempDir;

/// Chinook-style fixture with five customers and a couple of invoices.
pub const FIXTURE: &[&str] = &[
    "CREATE TABLE Customer (
        CustomerId INTEGER PRIMARY KEY,
        FirstName TEXT NOT NULL,
        LastName TEXT NOT NULL,
        Country TEXT
    )",
    "CREATE TABLE Invoice (
        InvoiceId INTEGER PRIMARY KEY,
        CustomerId INTEGER NOT NULL REFERENCES Customer (CustomerId),
        Total REAL NOT NULL
    )",
    "CREATE INDEX IFK_InvoiceCustomerId ON Invoice (CustomerId)",
    "INSERT INTO Customer VALUES (1, 'Luís', 'Gonçalves', 'Brazil')",
    "INSERT INTO Customer VALUES (2, 'Leonie', 'Köhler', 'Germany')",
    "INSERT INTO Customer VALUES (3, 'François', 'Tremblay', 'Canada')",
    "INSERT INTO Customer VALUES (4, 'Bjørn', 'Hansen', 'Norway')",
    "INSERT INTO Customer VALUES (5, 'František', 'Wichterlová', NULL)",
    "INSERT INTO Invoice VALUES (1, 2, 1.98)",
    "INSERT INTO Invoice VALUES (2, 4, 3.96)",
];

/// Writes the fixture to a temp file and returns its config.
pub async fn fixture_db() -> (DatabaseConfig, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chinook.sqlite");

    let mut conn = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    for statement in FIXTURE {
        sqlx::query(statement).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();

    let config = DatabaseConfig {
        path,
        ..DatabaseConfig::default()
    };
    (config, dir)
}

/// Opens a read-only client over a fresh fixture.
pub async fn fixture_client() -> (SqliteClient, TempDir) {
    let (config, dir) = fixture_db().await;
    (SqliteClient::open(&config).await.unwrap(), dir)
}
