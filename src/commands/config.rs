//! Config commands - show, locate and initialise the configuration

use std::path::Path;

use crate::cli::ConfigCommands;
use crate::config::{TaggartConfig, first_time_setup};
use crate::{TaggartError, output};

type Result<T> = std::result::Result<T, TaggartError>;

/// Execute configuration commands
///
/// # Errors
/// Returns an error if the configuration cannot be read, prompted for or saved
pub fn execute(path: &Path, command: &ConfigCommands, quiet: bool) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = TaggartConfig::load(path)?;
            let text = toml::to_string_pretty(&config)
                .map_err(|e| TaggartError::InvalidInput(format!("Failed to render config: {e}")))?;
            print!("{text}");
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Init => {
            let config = first_time_setup(path)?;
            if !quiet {
                println!(
                    "{}",
                    output::success(&format!(
                        "Catalog at {}, uploads in {}",
                        config.database_path.display(),
                        config.upload_dir.display()
                    ))
                );
            }
        }
    }
    Ok(())
}
