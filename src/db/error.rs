//! Catalog store error types
//!
//! This module defines all error types that can occur while reading or
//! writing the catalog. Errors are categorized so callers can tell a storage
//! fault apart from a lookup that simply found nothing.
//!
//! # Error Types
//!
//! - **`Sqlite`**: Errors from the underlying embedded `SQLite` database
//! - **`NotFound`**: A file, category or tag referenced by the caller is absent
//! - **`MissingFiles`**: A batch of file ids where some ids do not exist
//! - **`InvalidInput`**: Empty or otherwise unusable input
//! - **`Io`**: Filesystem errors from maintenance operations (backup)
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.

use thiserror::Error;

use super::types::FileId;

/// Catalog store errors
#[derive(Debug, Error)]
pub enum DbError {
    /// Represents an error from the embedded database
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Some ids of a batch do not resolve to a file
    #[error("File IDs not found: {}", format_ids(.0))]
    MissingFiles(Vec<FileId>),

    /// Invalid input provided (e.g., an empty category name)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error during a maintenance operation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Whether the error is a unique-constraint collision
    ///
    /// Used by the lazy get-or-create paths: a collision means another writer
    /// created the row first, so the caller re-reads instead of failing.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }

    /// Whether the error is specifically a `UNIQUE` collision, as opposed to
    /// a foreign key or trigger rejection
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

fn format_ids(ids: &[FileId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
