//! Alias commands - show and replace the tag alias groups

use colored::Colorize;

use crate::cli::AliasCommands;
use crate::config::ConfigHandle;
use crate::{TaggartError, output};

type Result<T> = std::result::Result<T, TaggartError>;

/// Execute alias management commands
///
/// # Errors
/// Returns an error if the JSON is invalid or the config cannot be saved
pub fn execute(handle: &ConfigHandle, command: &AliasCommands, quiet: bool) -> Result<()> {
    match command {
        AliasCommands::List => list(handle, quiet),
        AliasCommands::SetJson { json } => {
            let config = handle.update(|config| config.set_aliases_json(json))?;
            if !quiet {
                println!(
                    "{}",
                    output::success(&format!("Saved {} alias group(s)", config.tag_aliases.len()))
                );
            }
            Ok(())
        }
    }
}

fn list(handle: &ConfigHandle, quiet: bool) -> Result<()> {
    let config = handle.snapshot();
    if quiet {
        println!("{}", config.aliases_json()?);
        return Ok(());
    }
    if config.tag_aliases.is_empty() {
        println!("No alias groups configured.");
        return Ok(());
    }
    for group in &config.tag_aliases {
        println!(
            "  {} {} {}",
            group.category.cyan(),
            "→".dimmed(),
            group.aliases.join(" = ").yellow()
        );
    }
    Ok(())
}
