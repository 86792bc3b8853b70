//! Taggart CLI application entry point
//!
//! # Usage
//!
//! ```bash
//! # Store a file and tag it
//! taggart upload ~/Pictures/beach.jpg
//! taggart tag 1 colour blue
//! taggart tag 2 colour !          # copy the last colour used
//!
//! # Browse
//! taggart list untagged
//! taggart filter colour/blue/and/tag/size/large
//! taggart search "beach*"
//!
//! # Bulk edits
//! taggart bulk --range 1-20 --category album --value summer --op add
//! taggart bulk --query "colour:red OR colour:crimson" --category colour --op remove -y
//!
//! # Drift and thumbnails
//! taggart orphans
//! taggart thumbnails generate
//! ```
//!
//! # Configuration
//!
//! Configuration lives in the user's config directory
//! (`~/.config/taggart/config.toml` on Linux) unless `--config` is given;
//! `TAGGART_*` environment variables override file values. Log verbosity is
//! read from `TAGGART_LOG`.

use std::io;
use std::process::ExitCode;

use colored::Colorize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use taggart::bulk::BulkTagRequest;
use taggart::cli::{Cli, Commands};
use taggart::commands;
use taggart::config::{ConfigHandle, TaggartConfig};
use taggart::db::Database;
use taggart::lifecycle::LifecycleManager;
use taggart::TaggartError;

type Result<T> = std::result::Result<T, TaggartError>;

/// Environment variable holding the log filter
const LOG_ENV: &str = "TAGGART_LOG";

fn init_tracing(verbose: bool) {
    let default = if verbose { "taggart=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => TaggartConfig::config_path()?,
    };
    let quiet = cli.quiet;

    match &cli.command {
        Commands::Completions { shell } => {
            commands::completions(*shell, &mut io::stdout());
            return Ok(());
        }
        Commands::Config { command } => return commands::config::execute(&config_path, command, quiet),
        _ => {}
    }

    let handle = ConfigHandle::load(&config_path)?;
    if let Commands::Alias { command } = &cli.command {
        return commands::alias::execute(&handle, command, quiet);
    }

    let config = handle.snapshot();
    debug!(config = %config_path.display(), database = %config.database_path.display(), "starting");
    let db = Database::open(&config.database_path)?;
    let manager = LifecycleManager::new(&db, &config.upload_dir)?;

    match &cli.command {
        Commands::Upload { path, name } => commands::files::upload(&manager, path, name.as_deref(), quiet),
        Commands::Rename { id, new_name } => commands::files::rename(&manager, *id, new_name, quiet),
        Commands::Delete { id, yes } => commands::files::delete(&manager, &db, *id, *yes, quiet),
        Commands::Describe { id, text } => commands::files::describe(&db, *id, text, quiet),
        Commands::Show { id } => commands::files::show(&db, *id, quiet),
        Commands::Tag { id, category, value } => commands::tag::execute(&db, *id, category, value, quiet),
        Commands::Untag { id, category, value } => {
            commands::tag::untag(&db, *id, category, value.as_deref(), quiet)
        }
        Commands::List { scope, page } => commands::list::execute(&db, &config, *scope, *page, quiet),
        Commands::Filter { path, page } => commands::list::filter(&db, config, path, *page, quiet),
        Commands::Tags => commands::tags::execute(&db, quiet),
        Commands::Search { query } => commands::search::execute(&db, query, quiet),
        Commands::Bulk {
            selection,
            category,
            value,
            op,
            dry_run,
            yes,
        } => {
            let selection = selection.selection().ok_or_else(|| {
                TaggartError::InvalidInput("Either --range or --query is required".into())
            })?;
            let request = BulkTagRequest::new(category, value.as_deref(), (*op).into())?;
            commands::bulk::execute(&db, &selection, &request, *dry_run, *yes, quiet)
        }
        Commands::Recent => commands::list::recent(&db, quiet),
        Commands::Orphans => commands::maintenance::orphans(&db, &manager, quiet),
        Commands::Thumbnails { command } => {
            commands::maintenance::thumbnails(&db, &manager, command.as_ref(), quiet)
        }
        Commands::Admin { command } => commands::admin::execute(&db, command, quiet),
        Commands::Completions { .. } | Commands::Config { .. } | Commands::Alias { .. } => Ok(()),
    }
}

/// Main entry point for the taggart application
///
/// Parses command-line arguments, loads configuration, opens the catalog
/// and dispatches to the command handler. Errors are printed and turn into
/// a failing exit code.
fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
