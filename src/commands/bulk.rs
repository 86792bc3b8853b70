//! Bulk command - apply one tag change to a range or tag query of files

use colored::Colorize;

use super::confirm;
use crate::bulk::{self, BulkOperation, BulkTagRequest};
use crate::db::{Database, FileId};
use crate::query::Selection;
use crate::{TaggartError, output};

type Result<T> = std::result::Result<T, TaggartError>;

/// Number of target files listed before the summary line
const PREVIEW_LIMIT: usize = 10;

/// Execute the bulk command
///
/// # Errors
/// Returns an error if the selection is invalid, names unknown files, or
/// the edit fails; no file is changed in that case
pub fn execute(
    db: &Database,
    selection: &Selection,
    request: &BulkTagRequest,
    dry_run: bool,
    yes: bool,
    quiet: bool,
) -> Result<()> {
    let files = bulk::preview(db, selection)?;
    let label = match (request.operation(), request.value()) {
        (BulkOperation::Add, Some(value)) => format!("add {}:{}", request.category(), value),
        (BulkOperation::Remove, Some(value)) => format!("remove {}:{}", request.category(), value),
        (_, None) => format!("remove every {} tag", request.category()),
    };

    if dry_run || !quiet {
        if dry_run {
            println!("{}", "=== Dry Run Mode ===".yellow().bold());
        }
        println!("Would {label} on {} file(s)", files.len());
        for file in files.iter().take(PREVIEW_LIMIT) {
            println!("{}", output::file_line(file, false));
        }
        if files.len() > PREVIEW_LIMIT {
            println!("  ... and {} more", files.len() - PREVIEW_LIMIT);
        }
    }
    if dry_run {
        println!("\n{}", "Run without --dry-run to apply changes.".yellow());
        return Ok(());
    }

    if !confirm(&format!("Apply to {} file(s)?", files.len()), yes)? {
        println!("Operation cancelled.");
        return Ok(());
    }

    let ids: Vec<FileId> = files.iter().map(|f| f.id).collect();
    let outcome = bulk::apply(db, &ids, request)?;
    if !quiet {
        println!(
            "{}",
            output::success(&format!(
                "{} on {} file(s), {} tag association(s) changed",
                label, outcome.files, outcome.changed
            ))
        );
    }
    Ok(())
}
