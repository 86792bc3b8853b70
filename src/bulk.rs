//! Bulk tag edits
//!
//! Applies one tag change to many files. The whole batch runs in a single
//! transaction: either every file is updated or none is.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::tags::{
    find_category, find_tag, get_or_create_category, get_or_create_tag, link_file_tag,
    unlink_category, unlink_file_tag,
};
use crate::db::{Database, DbError, File, FileId};
use crate::query::{QueryError, Selection, resolve_selection, validate_file_ids};

/// Number of recent files offered on the bulk form
pub const RECENT_FILES: usize = 20;

/// Errors raised by bulk tag edits
#[derive(Debug, Error)]
pub enum BulkError {
    #[error("Category cannot be empty")]
    EmptyCategory,

    #[error("Value cannot be empty when adding tags")]
    MissingValue,

    #[error("Invalid operation '{0}' (must be 'add' or 'remove')")]
    UnknownOperation(String),

    #[error("Cannot remove non-existent category: {0}")]
    UnknownCategory(String),

    #[error("Cannot remove non-existent tag: {category}={value}")]
    UnknownTag { category: String, value: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Direction of a bulk edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BulkOperation {
    Add,
    Remove,
}

impl FromStr for BulkOperation {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            other => Err(BulkError::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
        })
    }
}

/// A validated bulk edit: one category, an optional value, one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkTagRequest {
    category: String,
    value: Option<String>,
    operation: BulkOperation,
}

impl BulkTagRequest {
    /// Build a request, trimming inputs.
    ///
    /// `add` needs a value. `remove` without a value removes every tag of
    /// the category.
    ///
    /// # Errors
    ///
    /// Returns `BulkError::EmptyCategory` or `BulkError::MissingValue`.
    pub fn new(
        category: &str,
        value: Option<&str>,
        operation: BulkOperation,
    ) -> Result<Self, BulkError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(BulkError::EmptyCategory);
        }
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        if operation == BulkOperation::Add && value.is_none() {
            return Err(BulkError::MissingValue);
        }
        Ok(Self {
            category: category.to_string(),
            value: value.map(str::to_string),
            operation,
        })
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[must_use]
    pub const fn operation(&self) -> BulkOperation {
        self.operation
    }
}

/// Result of a committed bulk edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Files the edit was applied to
    pub files: usize,
    /// Associations actually inserted or deleted
    pub changed: usize,
}

/// Data for a bulk edit form: known categories and the newest files
#[derive(Debug, Clone, Serialize)]
pub struct BulkFormData {
    pub categories: Vec<String>,
    pub recent_files: Vec<File>,
}

/// Collect the categories and the most recent files
///
/// # Errors
///
/// Returns `DbError` if a query fails.
pub fn form_data(db: &Database) -> Result<BulkFormData, DbError> {
    Ok(BulkFormData {
        categories: db.category_names()?,
        recent_files: db.recent_files(RECENT_FILES)?,
    })
}

/// Resolve and validate the files a selection targets, without changing anything
///
/// # Errors
///
/// Returns `BulkError::Query` if the selection is malformed, matches
/// nothing, or names unknown ids.
pub fn preview(db: &Database, selection: &Selection) -> Result<Vec<File>, BulkError> {
    let ids = resolve_selection(db, selection)?;
    Ok(validate_file_ids(db, &ids)?)
}

/// Apply `request` to every file in `ids` inside one transaction.
///
/// `ids` must already be validated (see [`preview`]).
///
/// # Errors
///
/// Returns `BulkError::UnknownCategory` / `BulkError::UnknownTag` when a
/// removal names something that was never created, or a store error. No
/// file is changed on error.
pub fn apply(
    db: &Database,
    ids: &[FileId],
    request: &BulkTagRequest,
) -> Result<BulkOutcome, BulkError> {
    let category = request.category();
    let outcome = db.write(|tx| {
        let mut changed = 0;
        match (request.operation(), request.value()) {
            (BulkOperation::Add, value) => {
                let value = value.ok_or(BulkError::MissingValue)?;
                let category_id = get_or_create_category(tx, category)?;
                let tag_id = get_or_create_tag(tx, category_id, value)?;
                for &id in ids {
                    changed += usize::from(link_file_tag(tx, id, tag_id)?);
                }
            }
            (BulkOperation::Remove, value) => {
                let category_id = find_category(tx, category)?
                    .ok_or_else(|| BulkError::UnknownCategory(category.to_string()))?;
                if let Some(value) = value {
                    let tag_id = find_tag(tx, category_id, value)?.ok_or_else(|| {
                        BulkError::UnknownTag {
                            category: category.to_string(),
                            value: value.to_string(),
                        }
                    })?;
                    for &id in ids {
                        changed += unlink_file_tag(tx, id, tag_id)?;
                    }
                } else {
                    for &id in ids {
                        changed += unlink_category(tx, id, category_id)?;
                    }
                }
            }
        }
        debug!(files = ids.len(), changed, "bulk edit staged");
        Ok::<_, BulkError>(BulkOutcome {
            files: ids.len(),
            changed,
        })
    })?;

    info!(
        operation = %request.operation(),
        category,
        value = request.value().unwrap_or("*"),
        files = outcome.files,
        changed = outcome.changed,
        "bulk tag edit committed"
    );
    Ok(outcome)
}

/// Resolve, validate and apply in one call
///
/// # Errors
///
/// See [`preview`] and [`apply`].
pub fn run(
    db: &Database,
    selection: &Selection,
    request: &BulkTagRequest,
) -> Result<BulkOutcome, BulkError> {
    let files = preview(db, selection)?;
    let ids: Vec<FileId> = files.iter().map(|f| f.id).collect();
    apply(db, &ids, request)
}
