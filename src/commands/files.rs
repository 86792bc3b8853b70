//! File commands - upload, rename, delete, describe and show

use colored::Colorize;
use std::fs;
use std::io::BufReader;
use std::path::Path;

use super::confirm;
use crate::db::{Database, FileId};
use crate::lifecycle::LifecycleManager;
use crate::{TaggartError, output};

type Result<T> = std::result::Result<T, TaggartError>;

/// Execute the upload command
///
/// # Errors
/// Returns an error if the source cannot be read or the upload fails
pub fn upload(
    manager: &LifecycleManager<'_>,
    source: &Path,
    name: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let filename = match name {
        Some(name) => name.to_string(),
        None => source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                TaggartError::InvalidInput(format!("'{}' has no file name", source.display()))
            })?,
    };
    let mut reader = BufReader::new(fs::File::open(source)?);
    let outcome = manager.upload(&filename, &mut reader)?;

    if quiet {
        println!("{}", outcome.id);
    } else {
        println!(
            "{}",
            output::success(&format!("Uploaded {} as #{}", outcome.filename.cyan(), outcome.id))
        );
    }
    if let Some(warning) = &outcome.warning {
        eprintln!("{}", output::warning(warning));
    }
    Ok(())
}

/// Execute the rename command
///
/// # Errors
/// Returns an error if the rename fails; the file is left as it was
pub fn rename(manager: &LifecycleManager<'_>, id: FileId, new_name: &str, quiet: bool) -> Result<()> {
    let file = manager.rename(id, new_name)?;
    if !quiet {
        println!(
            "{}",
            output::success(&format!("Renamed #{} to {}", file.id, file.filename.cyan()))
        );
    }
    Ok(())
}

/// Execute the delete command
///
/// # Errors
/// Returns an error if the file does not exist or the catalog delete fails
pub fn delete(manager: &LifecycleManager<'_>, db: &Database, id: FileId, yes: bool, quiet: bool) -> Result<()> {
    let file = db.get_file(id)?;
    if !confirm(&format!("Delete #{id} {}?", file.filename), yes)? {
        println!("Operation cancelled.");
        return Ok(());
    }

    let outcome = manager.delete(id)?;
    if !quiet {
        println!(
            "{}",
            output::success(&format!("Deleted #{} {}", outcome.file.id, outcome.file.filename))
        );
    }
    for warning in &outcome.warnings {
        eprintln!("{}", output::warning(warning));
    }
    Ok(())
}

/// Execute the describe command
///
/// # Errors
/// Returns an error if the file does not exist
pub fn describe(db: &Database, id: FileId, text: &str, quiet: bool) -> Result<()> {
    let stored = db.update_description(id, text)?;
    if !quiet {
        if stored.len() < text.len() {
            eprintln!(
                "{}",
                output::warning(&format!("description truncated to {} bytes", stored.len()))
            );
        }
        println!("{}", output::success(&format!("Updated description of #{id}")));
    }
    Ok(())
}

/// Execute the show command
///
/// # Errors
/// Returns an error if the file does not exist
pub fn show(db: &Database, id: FileId, quiet: bool) -> Result<()> {
    let detail = db.file_detail(id)?;
    println!("{}", output::file_with_tags(&detail.file, &detail.tags, quiet));
    if !quiet {
        println!("    {} {}", "path:".dimmed(), detail.file.path.display());
        if !detail.file.description.is_empty() {
            println!("    {} {}", "description:".dimmed(), detail.file.description);
        }
    }
    Ok(())
}
