//! Bulk selection language
//!
//! Turns either a file id range expression (`1-5,8`) or a tag query
//! (`colour:blue,size:large` / `colour:blue OR colour:red`) into a concrete,
//! validated set of files for bulk tag edits.

pub mod error;
pub mod range;
pub mod tag_query;

pub use error::QueryError;
pub use range::parse_range;
pub use tag_query::{QueryMode, TagPair, TagQuery};

use tracing::debug;

use crate::db::{Database, DbError, File, FileId};

/// How the target files of a bulk edit are chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A range expression such as `1-5,8`
    Range(String),
    /// A tag query such as `colour:blue OR colour:red`
    Query(String),
}

/// Resolve a selection to file ids, ascending.
///
/// Range expressions are not checked against the catalog here; pass the
/// result through [`validate_file_ids`].
///
/// # Errors
///
/// Returns `QueryError` for a malformed expression, or
/// `QueryError::NoMatches` when a tag query matches no file.
pub fn resolve_selection(db: &Database, selection: &Selection) -> Result<Vec<FileId>, QueryError> {
    match selection {
        Selection::Range(expr) => parse_range(expr),
        Selection::Query(text) => {
            let query = TagQuery::parse(text)?;
            let ids = db.matching_ids(&query.predicate())?;
            debug!(query = %query, matches = ids.len(), "resolved tag query");
            if ids.is_empty() {
                return Err(QueryError::NoMatches(text.trim().to_string()));
            }
            Ok(ids)
        }
    }
}

/// Check that every id names an existing file and return those files.
///
/// Every missing id is reported at once.
///
/// # Errors
///
/// Returns `QueryError::NoFileIds` for an empty batch and
/// `DbError::MissingFiles` (wrapped) listing all unknown ids.
pub fn validate_file_ids(db: &Database, ids: &[FileId]) -> Result<Vec<File>, QueryError> {
    if ids.is_empty() {
        return Err(QueryError::NoFileIds);
    }
    let missing = db.missing_file_ids(ids)?;
    if !missing.is_empty() {
        return Err(DbError::MissingFiles(missing).into());
    }
    Ok(db.files_by_ids(ids)?)
}
