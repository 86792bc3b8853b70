//! Error types for file lifecycle operations
//!
//! # Error Types
//!
//! - **`Validation`**: unusable input, rejected before anything is touched
//! - **`Conflict`**: the target filename is already in use
//! - **`NotFound`**: the file id does not exist
//! - **`Io`**: a filesystem step failed; carries what was being attempted
//! - **`Media`**: the media processor rejected or failed on the upload
//! - **`Catalog`**: the catalog store failed
//! - **`RolledBack`**: a step failed after earlier steps had changed the
//!   filesystem; those steps were reversed. The failing step is the source,
//!   any reversal that did not succeed is listed alongside it.

use std::io;
use thiserror::Error;

use super::media::MediaError;
use crate::db::{DbError, FileId};

/// Lifecycle operation errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("A file named '{0}' already exists")]
    Conflict(String),

    #[error("File {0} not found")]
    NotFound(FileId),

    #[error("Failed to {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Media processing failed: {0}")]
    Media(#[from] MediaError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] DbError),

    #[error("{operation} failed and was rolled back: {source}{}", rollback_note(.rollback_failures))]
    RolledBack {
        operation: &'static str,
        #[source]
        source: Box<LifecycleError>,
        rollback_failures: Vec<String>,
    },
}

fn rollback_note(failures: &[String]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!(" (rollback incomplete: {})", failures.join("; "))
    }
}

impl LifecycleError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// The error that started the failure, looking through `RolledBack`
    #[must_use]
    pub fn cause(&self) -> &Self {
        match self {
            Self::RolledBack { source, .. } => source.cause(),
            other => other,
        }
    }

    /// Whether disk and catalog may disagree after this error
    #[must_use]
    pub fn left_inconsistent(&self) -> bool {
        matches!(self, Self::RolledBack { rollback_failures, .. } if !rollback_failures.is_empty())
    }
}
