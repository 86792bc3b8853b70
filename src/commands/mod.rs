//! Command implementations
//!
//! Each command is a module with an execute function that takes parsed CLI
//! args and runs the operation against the catalog.

pub mod admin;
pub mod alias;
pub mod bulk;
pub mod config;
pub mod files;
pub mod list;
pub mod maintenance;
pub mod search;
pub mod tag;
pub mod tags;

use clap::CommandFactory;
use clap_complete::Shell;
use dialoguer::Confirm;
use std::io::Write;

use crate::TaggartError;
use crate::cli::Cli;

type Result<T> = std::result::Result<T, TaggartError>;

/// Ask for confirmation unless `yes` was given
///
/// # Errors
/// Returns an error if the prompt cannot be shown.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// Write a completion script for `shell`
pub fn completions<W: Write>(shell: Shell, buf: &mut W) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, buf);
}
