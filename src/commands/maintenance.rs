//! Maintenance commands - orphan report and thumbnail generation

use colored::Colorize;

use crate::cli::ThumbnailCommands;
use crate::db::Database;
use crate::lifecycle::LifecycleManager;
use crate::{TaggartError, orphans, output};

type Result<T> = std::result::Result<T, TaggartError>;

/// Execute the orphans command
///
/// Lists files on disk the catalog does not know, then catalogued files
/// whose content is gone. Nothing is repaired.
///
/// # Errors
/// Returns an error if the upload directory or the catalog cannot be read
pub fn orphans(db: &Database, manager: &LifecycleManager<'_>, quiet: bool) -> Result<()> {
    let upload_dir = manager.layout().root();
    let on_disk = orphans::list_orphans(db, upload_dir)?;
    let missing = orphans::missing_on_disk(db)?;

    if quiet {
        for name in &on_disk {
            println!("{name}");
        }
        return Ok(());
    }

    if on_disk.is_empty() && missing.is_empty() {
        println!("No drift found. Upload directory and catalog agree.");
        return Ok(());
    }
    if !on_disk.is_empty() {
        println!("{}", "=== Not in catalog ===".bold());
        for name in &on_disk {
            println!("  {}", name.yellow());
        }
    }
    if !missing.is_empty() {
        println!("{}", "=== Missing on disk ===".bold());
        for file in &missing {
            println!("{} {}", output::file_line(file, false), file.path.display().to_string().red());
        }
    }
    Ok(())
}

/// Execute the thumbnails command
///
/// # Errors
/// Returns an error if the catalog cannot be read or, for a single file,
/// rendering fails
pub fn thumbnails(
    db: &Database,
    manager: &LifecycleManager<'_>,
    command: Option<&ThumbnailCommands>,
    quiet: bool,
) -> Result<()> {
    match command {
        None => {
            let missing = orphans::missing_thumbnails(db, manager.layout())?;
            if missing.is_empty() && !quiet {
                println!("Every video has a thumbnail.");
            }
            for file in &missing {
                println!("{}", output::file_line(file, quiet));
            }
        }
        Some(ThumbnailCommands::Generate { id: Some(id), at }) => {
            let path = manager.generate_thumbnail(*id, at.as_deref())?;
            if !quiet {
                println!("{}", output::success(&format!("Wrote {}", path.display())));
            }
        }
        Some(ThumbnailCommands::Generate { id: None, .. }) => {
            let report = manager.generate_missing_thumbnails()?;
            if !quiet {
                for name in &report.generated {
                    println!("{}", output::success(name));
                }
            }
            for (name, error) in &report.failures {
                eprintln!("{} {name}: {error}", "✗".red().bold());
            }
            if !quiet {
                println!(
                    "\nGenerated {} thumbnail(s), {} failed",
                    report.generated.len(),
                    report.failures.len()
                );
            }
        }
    }
    Ok(())
}
