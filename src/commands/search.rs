//! Search command - free-text search over filenames, descriptions and tags

use crate::db::Database;
use crate::{TaggartError, output};

type Result<T> = std::result::Result<T, TaggartError>;

/// Execute the search command
///
/// # Errors
/// Returns an error if the catalog query fails
pub fn execute(db: &Database, query: &str, quiet: bool) -> Result<()> {
    let results = db.search(query)?;
    if results.is_empty() {
        if !quiet {
            println!("No files match '{query}'.");
        }
        return Ok(());
    }

    if !quiet {
        println!("Found {} file(s):", results.len());
    }
    for detail in &results {
        println!("{}", output::file_with_tags(&detail.file, &detail.tags, quiet));
    }
    Ok(())
}
