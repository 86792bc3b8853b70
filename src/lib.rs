//! Taggart - a personal media catalog with categorized tags
//!
//! This library keeps a catalog of uploaded files in an embedded `SQLite`
//! database, tags them with `category:value` pairs, resolves tag filters
//! (with configurable alias groups), applies bulk tag edits, and keeps the
//! upload directory and the catalog in step across uploads, renames and
//! deletes.

use thiserror::Error;

pub mod bulk;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod filter;
pub mod lifecycle;
pub mod orphans;
pub mod output;
pub mod query;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum TaggartError {
    /// Catalog store error
    #[error("Database error: {0}")]
    DbError(#[from] db::DbError),
    /// Filter path error
    #[error(transparent)]
    FilterError(#[from] filter::FilterError),
    /// Range or tag query error
    #[error(transparent)]
    QueryError(#[from] query::QueryError),
    /// Bulk edit error
    #[error(transparent)]
    BulkError(#[from] bulk::BulkError),
    /// Upload, rename or delete error
    #[error(transparent)]
    LifecycleError(#[from] lifecycle::LifecycleError),
    /// Drift scan error
    #[error(transparent)]
    OrphanError(#[from] orphans::OrphanError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Interactive prompt error
    #[error("Prompt error: {0}")]
    PromptError(#[from] dialoguer::Error),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
