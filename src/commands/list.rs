//! Listing commands - paginated file lists, tag filters and recent files

use colored::Colorize;

use crate::bulk;
use crate::cli::ListScope;
use crate::config::TaggartConfig;
use crate::db::{Database, File, Pagination};
use crate::filter::{FilterResolver, Predicate};
use crate::{TaggartError, output};
use std::sync::Arc;

type Result<T> = std::result::Result<T, TaggartError>;

impl ListScope {
    /// The predicate selecting the files in this scope
    #[must_use]
    pub fn predicate(self) -> Predicate {
        match self {
            Self::All => Predicate::Always,
            Self::Tagged => Predicate::Tagged,
            Self::Untagged => Predicate::untagged(),
        }
    }
}

fn print_page(files: &[File], pagination: &Pagination, total: usize, quiet: bool) {
    if files.is_empty() {
        if !quiet {
            println!("No files found.");
        }
        return;
    }
    for file in files {
        println!("{}", output::file_line(file, quiet));
    }
    if !quiet {
        println!("\n{}", output::page_footer(pagination, total));
    }
}

/// Execute the list command
///
/// # Errors
/// Returns an error if the catalog query fails
pub fn execute(db: &Database, config: &TaggartConfig, scope: ListScope, page: usize, quiet: bool) -> Result<()> {
    let per_page = config.items_per_page;
    let result = db.list_files(&scope.predicate(), page, per_page)?;
    let pagination = Pagination::new(page, result.total, per_page);
    print_page(&result.files, &pagination, result.total, quiet);
    Ok(())
}

/// Execute the filter command
///
/// # Errors
/// Returns an error if the path is malformed or the catalog query fails
pub fn filter(db: &Database, config: Arc<TaggartConfig>, path: &str, page: usize, quiet: bool) -> Result<()> {
    let list = FilterResolver::new(db, config).resolve(path, page)?;
    if !quiet {
        println!("{}", output::breadcrumb_trail(&list.breadcrumbs));
        println!("{}\n", list.title.bold());
        for filter in list.filters.iter().filter(|f| f.values.len() > 1) {
            println!(
                "  {} {}: {}",
                "aliases".dimmed(),
                filter.category,
                filter.values.join(" | ")
            );
        }
    }
    print_page(&list.files, &list.pagination, list.total, quiet);
    Ok(())
}

/// Execute the recent command
///
/// # Errors
/// Returns an error if the catalog query fails
pub fn recent(db: &Database, quiet: bool) -> Result<()> {
    let data = bulk::form_data(db)?;
    if !quiet {
        println!("{}", "Categories:".bold());
        if data.categories.is_empty() {
            println!("  (none)");
        } else {
            println!("  {}", data.categories.join(", "));
        }
        println!("\n{}", format!("Newest {} files:", bulk::RECENT_FILES).bold());
    }
    for file in &data.recent_files {
        println!("{}", output::file_line(file, quiet));
    }
    Ok(())
}
