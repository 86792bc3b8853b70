//! Error types for tag filter resolution

use thiserror::Error;

use crate::db::DbError;

/// Errors that can occur while resolving a tag filter
#[derive(Debug, Error)]
pub enum FilterError {
    /// The filter path contained no `category/value` pairs
    #[error("Empty tag filter path")]
    EmptyPath,

    /// A path segment is not exactly `category/value`
    #[error("Invalid tag filter segment '{0}', expected 'category/value'")]
    InvalidSegment(String),

    /// Store error while running the filter
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}
