//! Error types for bulk selection expressions

use thiserror::Error;

use crate::db::DbError;

/// Errors that can occur while parsing or resolving a bulk selection
#[derive(Debug, Error)]
pub enum QueryError {
    /// A range token is malformed; carries the token and the reason
    #[error("Invalid range '{0}': {1}")]
    InvalidRange(String, String),

    /// A tag pair is not `category:value`
    #[error("Invalid tag format '{0}', expected 'category:value'")]
    InvalidTagPair(String),

    /// The tag query was blank
    #[error("Empty query")]
    EmptyQuery,

    /// The tag query contained only separators
    #[error("No valid tags found in query")]
    NoTags,

    /// The selection resolved to no ids at all
    #[error("No file IDs provided")]
    NoFileIds,

    /// The tag query is valid but no file matches it
    #[error("No files match query '{0}'")]
    NoMatches(String),

    /// Store error, including ids that do not resolve to a file
    #[error(transparent)]
    Database(#[from] DbError),
}

impl QueryError {
    /// Whether the error is a user-facing "nothing matched" condition
    /// rather than a fault
    #[must_use]
    pub const fn is_no_matches(&self) -> bool {
        matches!(self, Self::NoMatches(_))
    }
}
