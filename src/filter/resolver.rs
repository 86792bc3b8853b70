//! Alias expansion and resolution of `category/value` filter paths
//!
//! A filter path looks like `colour/red/and/tag/size/large`. Each pair is
//! turned into a [`TagFilter`]: the literal value `unassigned` selects files
//! with no tag in the category, any other value is widened to its alias
//! group. All pairs are ANDed together.

use heck::ToTitleCase;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::error::FilterError;
use super::predicate::Predicate;
use crate::config::{TagAliasGroup, TaggartConfig};
use crate::db::{Database, File, Pagination};

/// Filter value selecting files with no tag in the category
pub const UNASSIGNED: &str = "unassigned";

const PAIR_SEPARATOR: &str = "/and/tag/";

/// Expand `value` to the alias group it belongs to within `category`.
///
/// The requested value always comes first, followed by every member of the
/// first group that contains it (matched case-insensitively, de-duplicated
/// exactly). A value outside every group expands to itself only.
#[must_use]
pub fn expand_aliases(groups: &[TagAliasGroup], category: &str, value: &str) -> Vec<String> {
    let mut values = vec![value.to_string()];
    let group = groups
        .iter()
        .filter(|g| g.category == category)
        .find(|g| g.aliases.iter().any(|a| same_value(a, value)));

    if let Some(group) = group {
        values.extend(
            group
                .aliases
                .iter()
                .filter(|a| a.as_str() != value)
                .cloned(),
        );
    }
    values
}

fn same_value(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// One requested `(category, value)` filter with its effective value set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFilter {
    pub category: String,
    pub value: String,
    /// Alias-expanded values; empty for an `unassigned` filter
    pub values: Vec<String>,
}

impl TagFilter {
    #[must_use]
    pub fn new(groups: &[TagAliasGroup], category: &str, value: &str) -> Self {
        let values = if value == UNASSIGNED {
            Vec::new()
        } else {
            expand_aliases(groups, category, value)
        };
        Self {
            category: category.to_string(),
            value: value.to_string(),
            values,
        }
    }

    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.value == UNASSIGNED
    }

    #[must_use]
    pub fn predicate(&self) -> Predicate {
        if self.is_unassigned() {
            Predicate::unassigned(&self.category)
        } else {
            Predicate::has_any_tag(&self.category, self.values.clone())
        }
    }
}

/// AND of every filter's predicate
#[must_use]
pub fn build_predicate(filters: &[TagFilter]) -> Predicate {
    Predicate::And(filters.iter().map(TagFilter::predicate).collect())
}

/// Split a filter path into `(category, value)` pairs.
///
/// A leading `/` and `tag/` prefix are accepted, so both
/// `/tag/colour/red` and `colour/red` parse.
///
/// # Errors
///
/// Returns `FilterError::EmptyPath` for an empty path and
/// `FilterError::InvalidSegment` for a segment that is not `category/value`.
pub fn parse_filter_path(path: &str) -> Result<Vec<(String, String)>, FilterError> {
    let path = path.trim().trim_start_matches('/');
    let path = path.strip_prefix("tag/").unwrap_or(path);
    if path.is_empty() {
        return Err(FilterError::EmptyPath);
    }

    path.split(PAIR_SEPARATOR)
        .map(|segment| match segment.split('/').collect::<Vec<_>>().as_slice() {
            [category, value] if !category.is_empty() && !value.is_empty() => {
                Ok((category.to_string(), value.to_string()))
            }
            _ => Err(FilterError::InvalidSegment(segment.to_string())),
        })
        .collect()
}

/// A navigation crumb for a filtered listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub url: String,
}

impl Breadcrumb {
    fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Crumbs for a filter: Home, Tags, then each category (first occurrence
/// only) followed by its value linking to the cumulative filter path.
#[must_use]
pub fn breadcrumbs(pairs: &[(String, String)]) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb::new("Home", "/"), Breadcrumb::new("Tags", "/tags")];
    let mut seen = HashSet::new();
    let mut current = String::from("/tag");

    for (i, (category, value)) in pairs.iter().enumerate() {
        if i > 0 {
            current.push_str("/and/tag");
        }
        current.push('/');
        current.push_str(category);
        current.push('/');
        current.push_str(value);

        if seen.insert(category.as_str()) {
            crumbs.push(Breadcrumb::new(
                category.to_title_case(),
                format!("/tags#tag-{category}"),
            ));
        }
        crumbs.push(Breadcrumb::new(value.to_title_case(), current.clone()));
    }
    crumbs
}

/// Page title for a filter: `Tagged: colour: red, size: large`
#[must_use]
pub fn filter_title(pairs: &[(String, String)]) -> String {
    let parts: Vec<String> = pairs.iter().map(|(c, v)| format!("{c}: {v}")).collect();
    format!("Tagged: {}", parts.join(", "))
}

/// One page of a filtered listing with its navigation data
#[derive(Debug, Clone, Serialize)]
pub struct FilteredFileList {
    pub files: Vec<File>,
    pub total: usize,
    pub pagination: Pagination,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub title: String,
    pub filters: Vec<TagFilter>,
}

/// Resolves filter paths against the catalog using one configuration snapshot
pub struct FilterResolver<'a> {
    db: &'a Database,
    config: Arc<TaggartConfig>,
}

impl<'a> FilterResolver<'a> {
    #[must_use]
    pub fn new(db: &'a Database, config: Arc<TaggartConfig>) -> Self {
        Self { db, config }
    }

    /// Build the filters for parsed pairs using the configured alias groups
    #[must_use]
    pub fn filters(&self, pairs: &[(String, String)]) -> Vec<TagFilter> {
        pairs
            .iter()
            .map(|(category, value)| TagFilter::new(&self.config.tag_aliases, category, value))
            .collect()
    }

    /// Resolve a filter path to one page of matching files, newest first
    ///
    /// # Errors
    ///
    /// Returns `FilterError` if the path is malformed or the store fails.
    pub fn resolve(&self, path: &str, page: usize) -> Result<FilteredFileList, FilterError> {
        let pairs = parse_filter_path(path)?;
        let filters = self.filters(&pairs);
        let predicate = build_predicate(&filters);
        let per_page = self.config.items_per_page;

        debug!(?predicate, page, per_page, "resolving tag filter");
        let result = self.db.list_files(&predicate, page, per_page)?;

        Ok(FilteredFileList {
            pagination: Pagination::new(page, result.total, per_page),
            total: result.total,
            files: result.files,
            breadcrumbs: breadcrumbs(&pairs),
            title: filter_title(&pairs),
            filters,
        })
    }
}
