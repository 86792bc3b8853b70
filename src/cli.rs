//! Command-line interface definitions and parsing
//!
//! This module defines the complete CLI structure for taggart using the
//! `clap` crate.
//!
//! # Commands
//!
//! - **upload / rename / delete**: file lifecycle
//! - **describe / show**: file details
//! - **tag / untag**: per-file tag edits
//! - **list / filter / tags / search**: browsing the catalog
//! - **bulk**: apply one tag change to a range or tag query of files
//! - **orphans / thumbnails**: drift and thumbnail maintenance
//! - **alias / admin / config**: configuration and database maintenance
//!
//! # Examples
//!
//! ```
//! use taggart::cli::{Cli, Commands};
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["taggart", "tag", "4", "colour", "blue"]);
//! assert!(matches!(cli.command, Commands::Tag { id: 4, .. }));
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::bulk::BulkOperation;
use crate::db::FileId;
use crate::query::Selection;

/// Value for `tag` meaning "copy the most recent value of this category"
pub const COPY_PREVIOUS_VALUE: &str = "!";

/// Which files `list` shows
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListScope {
    /// Every file
    #[default]
    All,
    /// Files with at least one tag
    Tagged,
    /// Files without any tag
    Untagged,
}

/// Bulk operation kind
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOp {
    Add,
    Remove,
}

impl From<BulkOp> for BulkOperation {
    fn from(op: BulkOp) -> Self {
        match op {
            BulkOp::Add => Self::Add,
            BulkOp::Remove => Self::Remove,
        }
    }
}

/// How a bulk command selects its files
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SelectionArgs {
    /// File id ranges, e.g. `1-5,8,10-12`
    #[arg(short = 'r', long = "range", value_name = "RANGE")]
    pub range: Option<String>,

    /// Tag query, e.g. `colour:blue,size:large` or `colour:blue OR colour:red`
    #[arg(short = 'q', long = "query", value_name = "QUERY")]
    pub query: Option<String>,
}

impl SelectionArgs {
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        match (&self.range, &self.query) {
            (Some(range), _) => Some(Selection::Range(range.clone())),
            (None, Some(query)) => Some(Selection::Query(query.clone())),
            (None, None) => None,
        }
    }
}

/// Thumbnail maintenance subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ThumbnailCommands {
    /// Render thumbnails for videos that lack one, or re-render one video
    Generate {
        /// Only this file
        #[arg(long = "id")]
        id: Option<FileId>,

        /// Frame offset as HH:MM:SS (requires --id)
        #[arg(long = "at", value_name = "HH:MM:SS", requires = "id")]
        at: Option<String>,
    },
}

/// Tag alias subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AliasCommands {
    /// Show the configured alias groups
    #[command(visible_alias = "ls")]
    List,

    /// Replace every alias group from a JSON array
    #[command(name = "set-json")]
    SetJson {
        /// e.g. `[{"category":"colour","aliases":["red","crimson"]}]`
        json: String,
    },
}

/// Database maintenance subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommands {
    /// Write a timestamped copy of the database next to it
    Backup,
    /// Compact the database file
    Vacuum,
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the configuration file location
    Path,
    /// Interactively write a new configuration file
    Init,
}

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "taggart")]
#[command(about = "A personal media catalog with categorized tags", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the user config directory)
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Suppress informational output (only print results)
    #[arg(long = "quiet", global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Copy a file into the upload directory and catalog it
    #[command(visible_alias = "up")]
    Upload {
        /// File to upload
        path: PathBuf,

        /// Store under this name instead of the source filename
        #[arg(short = 'n', long = "name")]
        name: Option<String>,
    },

    /// Rename a stored file
    #[command(visible_alias = "mv")]
    Rename { id: FileId, new_name: String },

    /// Delete a file, its tags and its thumbnail
    #[command(visible_alias = "rm")]
    Delete {
        id: FileId,

        /// Skip confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },

    /// Set a file's description
    Describe { id: FileId, text: String },

    /// Show a file with its tags
    Show { id: FileId },

    /// Tag a file (`!` as value copies the latest value used for the category)
    #[command(visible_alias = "t")]
    Tag {
        id: FileId,
        category: String,
        value: String,
    },

    /// Remove one tag, or a whole category when no value is given
    #[command(visible_alias = "u")]
    Untag {
        id: FileId,
        category: String,
        value: Option<String>,
    },

    /// List files, newest first
    #[command(visible_alias = "l")]
    List {
        #[arg(value_enum, default_value_t = ListScope::All)]
        scope: ListScope,

        #[arg(short = 'p', long = "page", default_value_t = 1)]
        page: usize,
    },

    /// Files matching a tag path such as `colour/blue/and/tag/size/large`
    #[command(visible_alias = "f")]
    Filter {
        path: String,

        #[arg(short = 'p', long = "page", default_value_t = 1)]
        page: usize,
    },

    /// Every tag value with its file count
    Tags,

    /// Search filenames, descriptions and tag values (`*` and `?` wildcards)
    #[command(visible_alias = "s")]
    Search { query: String },

    /// Add or remove one tag across many files
    #[command(visible_alias = "b")]
    Bulk {
        #[command(flatten)]
        selection: SelectionArgs,

        #[arg(long = "category")]
        category: String,

        /// Required for add; remove without a value clears the category
        #[arg(long = "value")]
        value: Option<String>,

        #[arg(long = "op", value_enum)]
        op: BulkOp,

        /// Only show the files that would be changed
        #[arg(long = "dry-run")]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },

    /// Newest files and known categories, for picking bulk targets
    Recent,

    /// Files in the upload directory the catalog does not know
    Orphans,

    /// Videos without a thumbnail
    Thumbnails {
        #[command(subcommand)]
        command: Option<ThumbnailCommands>,
    },

    /// Manage tag alias groups
    Alias {
        #[command(subcommand)]
        command: AliasCommands,
    },

    /// Database maintenance
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
