//! Interactive setup wizard for first-time configuration
//!
//! Prompts for where the catalog and the uploaded files should live when
//! taggart is run for the first time.

use super::TaggartConfig;
use config::ConfigError;
use dialoguer::{Input, theme::ColorfulTheme};
use std::path::{Path, PathBuf};

fn prompt(label: &str, default: String) -> Result<String, ConfigError> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt(label)
        .default(default)
        .interact_text()
        .map_err(|e| ConfigError::Message(format!("Failed to read input: {e}")))
}

/// Interactive first-time setup
///
/// Guides the user through creating the initial configuration:
/// 1. Prompts for the catalog database location (default: system data directory)
/// 2. Prompts for the upload directory
/// 3. Prompts for the instance name
/// 4. Saves the configuration to `path`
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The system data directory cannot be determined
/// - User input cannot be read
/// - The configuration is invalid or cannot be saved
pub fn first_time_setup(path: &Path) -> Result<TaggartConfig, ConfigError> {
    println!("Welcome to taggart! Let's set up your catalog.\n");

    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| ConfigError::Message("Could not determine data directory".to_string()))?
        .join("taggart");
    let defaults = TaggartConfig::default();

    let database_path = prompt(
        "Catalog database",
        data_dir.join(&defaults.database_path).to_string_lossy().to_string(),
    )?;
    let upload_dir = prompt(
        "Upload directory",
        data_dir.join(&defaults.upload_dir).to_string_lossy().to_string(),
    )?;
    let instance_name = prompt("Instance name", defaults.instance_name.clone())?;

    let config = TaggartConfig {
        database_path: PathBuf::from(database_path),
        upload_dir: PathBuf::from(upload_dir),
        instance_name,
        ..defaults
    };
    config.validate()?;
    config.save(path)?;

    println!("\nConfiguration saved to {}", path.display());
    Ok(config)
}
