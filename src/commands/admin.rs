//! Admin commands - database backup and vacuum

use crate::cli::AdminCommands;
use crate::db::Database;
use crate::{TaggartError, output};

type Result<T> = std::result::Result<T, TaggartError>;

/// Execute database maintenance commands
///
/// # Errors
/// Returns an error if the backup or vacuum fails
pub fn execute(db: &Database, command: &AdminCommands, quiet: bool) -> Result<()> {
    match command {
        AdminCommands::Backup => {
            let path = db.backup()?;
            if quiet {
                println!("{}", path.display());
            } else {
                println!("{}", output::success(&format!("Backup written to {}", path.display())));
            }
        }
        AdminCommands::Vacuum => {
            db.vacuum()?;
            if !quiet {
                println!("{}", output::success("Database compacted"));
            }
        }
    }
    Ok(())
}
