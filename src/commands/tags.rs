//! Tags command - the tag index grouped by category

use colored::Colorize;

use crate::db::Database;
use crate::{TaggartError, output};

type Result<T> = std::result::Result<T, TaggartError>;

/// Execute the tags command
///
/// # Errors
/// Returns an error if the catalog query fails
pub fn execute(db: &Database, quiet: bool) -> Result<()> {
    let index = db.tag_counts()?;
    if index.is_empty() {
        if !quiet {
            println!("No tags found in database.");
        }
        return Ok(());
    }

    for (category, values) in &index {
        if quiet {
            for tag in values {
                println!("{category}:{}", output::tag_with_count(tag, true));
            }
            continue;
        }
        println!("{}", category.cyan().bold());
        for tag in values {
            println!("{}", output::tag_with_count(tag, false));
        }
    }
    Ok(())
}
