//! Output formatting for CLI display
//!
//! Plain-text renderings of catalog values. Color is applied here so the
//! command modules only decide what to print.

use colored::Colorize;
use std::fmt::Write as _;

use crate::db::{File, Pagination, TagCount, TagMap};
use crate::filter::Breadcrumb;

/// `  #12 holiday.jpg`
#[must_use]
pub fn file_line(file: &File, quiet: bool) -> String {
    if quiet {
        file.id.to_string()
    } else {
        format!("  {} {}", format!("#{}", file.id).dimmed(), file.filename)
    }
}

/// `category: value, value` lines, one per category
#[must_use]
pub fn tag_lines(tags: &TagMap) -> Vec<String> {
    tags.iter()
        .map(|(category, values)| format!("    {}: {}", category.cyan(), values.join(", ")))
        .collect()
}

/// A file followed by its tags, or `(no tags)`
#[must_use]
pub fn file_with_tags(file: &File, tags: &TagMap, quiet: bool) -> String {
    let mut out = file_line(file, quiet);
    if quiet {
        return out;
    }
    if tags.is_empty() {
        out.push_str(&" (no tags)".dimmed().to_string());
    } else {
        for line in tag_lines(tags) {
            out.push('\n');
            out.push_str(&line);
        }
    }
    out
}

/// Format a tag value with usage count
#[must_use]
pub fn tag_with_count(tag: &TagCount, quiet: bool) -> String {
    if quiet {
        tag.value.clone()
    } else {
        format!("  {} (used by {} file(s))", tag.value, tag.count)
    }
}

/// `Page 2 of 5 (412 files)` plus navigation hints
#[must_use]
pub fn page_footer(pagination: &Pagination, total: usize) -> String {
    let mut out = format!(
        "Page {} of {} ({total} file(s))",
        pagination.current_page, pagination.total_pages
    );
    if pagination.has_prev {
        let _ = write!(out, "  {} --page {}", "prev:".dimmed(), pagination.prev_page);
    }
    if pagination.has_next {
        let _ = write!(out, "  {} --page {}", "next:".dimmed(), pagination.next_page);
    }
    out
}

/// `Home > Tags > Colour > Blue`
#[must_use]
pub fn breadcrumb_trail(crumbs: &[Breadcrumb]) -> String {
    crumbs
        .iter()
        .map(|crumb| crumb.name.as_str())
        .collect::<Vec<_>>()
        .join(&format!(" {} ", ">".dimmed()))
}

/// Green check mark prefix for successful actions
#[must_use]
pub fn success(message: &str) -> String {
    format!("{} {message}", "✓".green().bold())
}

/// Yellow prefix for non-fatal warnings
#[must_use]
pub fn warning(message: &str) -> String {
    format!("{} {message}", "warning:".yellow().bold())
}
