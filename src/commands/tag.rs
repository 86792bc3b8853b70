//! Tag and untag commands

use colored::Colorize;

use crate::cli::COPY_PREVIOUS_VALUE;
use crate::db::{Database, FileId};
use crate::{TaggartError, output};

type Result<T> = std::result::Result<T, TaggartError>;

/// Resolve the value to apply, expanding `!` to the latest value used for
/// `category` on another file
///
/// # Errors
/// Returns `InvalidInput` if `!` is given and no other file has the category
pub fn resolve_value(db: &Database, id: FileId, category: &str, value: &str) -> Result<String> {
    if value.trim() != COPY_PREVIOUS_VALUE {
        return Ok(value.to_string());
    }
    db.previous_tag_value(category, id)?.ok_or_else(|| {
        TaggartError::InvalidInput(format!("No previous value to copy for category '{category}'"))
    })
}

/// Execute the tag command - add one `category:value` tag to a file
///
/// # Errors
/// Returns an error if the file does not exist or the tag is empty
pub fn execute(db: &Database, id: FileId, category: &str, value: &str, quiet: bool) -> Result<()> {
    let value = resolve_value(db, id, category, value)?;
    db.add_tag(id, category, &value)?;
    if !quiet {
        println!(
            "{}",
            output::success(&format!(
                "Tagged #{id} with {}:{}",
                category.trim().cyan(),
                value.trim().yellow()
            ))
        );
    }
    Ok(())
}

/// Execute the untag command - remove one tag, or a whole category
///
/// # Errors
/// Returns an error if the catalog update fails
pub fn untag(db: &Database, id: FileId, category: &str, value: Option<&str>, quiet: bool) -> Result<()> {
    let message = match value {
        Some(value) => {
            if db.remove_tag(id, category, value)? {
                format!("Removed {}:{} from #{id}", category.cyan(), value.yellow())
            } else {
                format!("#{id} had no tag {category}:{value}")
            }
        }
        None => {
            let removed = db.remove_category(id, category)?;
            format!("Removed {removed} {} tag(s) from #{id}", category.cyan())
        }
    };
    if !quiet {
        println!("{}", output::success(&message));
    }
    Ok(())
}
