//! Schema text used by the SQL-generation and meta-answer prompts.
//!
//! The schema is loaded once at startup, either from a DDL file or by
//! introspecting the database, and then shared read-only by every
//! pipeline invocation.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::{SchemaConfig, SchemaSourceKind};
use crate::db::DatabaseClient;
use crate::error::{QuillError, Result};

/// Immutable DDL text describing the target database.
///
/// Cloning is cheap; all clones share one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaText(Arc<str>);

impl SchemaText {
    /// Wraps DDL text, rejecting whitespace-only input.
    pub fn new(text: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref();
        if text.trim().is_empty() {
            return Err(QuillError::schema("Schema is empty"));
        }
        Ok(Self(Arc::from(text)))
    }

    /// Loads the schema from the configured source.
    pub async fn load(config: &SchemaConfig, db: &dyn DatabaseClient) -> Result<Self> {
        match config.source {
            SchemaSourceKind::File => Self::from_file(&config.path),
            SchemaSourceKind::Database => Self::from_database(db).await,
        }
    }

    /// Reads and decodes a DDL file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            QuillError::schema(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let text = decode(&bytes).ok_or_else(|| {
            QuillError::schema(format!("{} is not valid UTF-8 or UTF-16 text", path.display()))
        })?;

        let schema = Self::new(text).map_err(|_| {
            QuillError::schema(format!("Schema file {} is empty", path.display()))
        })?;
        info!(path = %path.display(), chars = schema.len(), "Loaded schema from file");
        Ok(schema)
    }

    /// Introspects the DDL from the database itself.
    pub async fn from_database(db: &dyn DatabaseClient) -> Result<Self> {
        let text = db.introspect_schema().await?;
        let schema = Self::new(text)
            .map_err(|_| QuillError::schema("Database contains no tables"))?;
        info!(chars = schema.len(), "Loaded schema from database");
        Ok(schema)
    }

    /// Returns the schema as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; empty schemas are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SchemaText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Decodes text by byte-order mark, falling back to UTF-8 and then BOM-less UTF-16 LE.
fn decode(bytes: &[u8]) -> Option<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec()).ok();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => Some(text),
        Err(_) => decode_utf16(bytes, u16::from_le_bytes),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}
