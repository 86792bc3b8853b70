//! Catalog entity types
//!
//! Plain data carried between the store, the query layers and the CLI.
//! These types are decoupled from any rendering technology; each operation
//! returns one of these named values instead of an ad-hoc tuple.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Stable identity of a catalogued file
pub type FileId = i64;
/// Identity of a tag category
pub type CategoryId = i64;
/// Identity of a `(category, value)` tag
pub type TagId = i64;

/// Tags of a single file, grouped by category name
pub type TagMap = BTreeMap<String, Vec<String>>;

/// A catalogued file row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    pub id: FileId,
    pub filename: String,
    pub path: PathBuf,
    pub description: String,
}

/// A file together with its tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDetail {
    pub file: File,
    pub tags: TagMap,
}

/// A tag value and the number of files carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub value: String,
    pub count: usize,
}

/// Aggregate for the tag index: category name -> values with file counts
pub type TagIndex = BTreeMap<String, Vec<TagCount>>;

/// One page of a file listing plus the total number of matches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilePage {
    pub files: Vec<File>,
    pub total: usize,
}

/// Navigation state for a paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_page: usize,
    pub next_page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Compute pagination for `total` items shown `per_page` at a time.
    ///
    /// There is always at least one page, even for an empty listing.
    #[must_use]
    pub fn new(page: usize, total: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total_pages = total.div_ceil(per_page).max(1);
        Self {
            current_page: page,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
            prev_page: page - 1,
            next_page: page + 1,
            per_page,
        }
    }
}

/// Clamp a 1-based page number and return the matching row offset
#[must_use]
pub(crate) fn page_offset(page: usize, per_page: usize) -> usize {
    (page.max(1) - 1).saturating_mul(per_page)
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
