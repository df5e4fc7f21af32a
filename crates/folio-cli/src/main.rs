//! # Folio CLI
//!
//! Command-line interface for the Folio project-file index.
//!
//! ## Commands
//!
//! - `folio index` - Build or rebuild the search index
//! - `folio query <terms>` - Search for files and folders
//! - `folio status` - Show index status and statistics
//! - `folio ls <dir>` - List a folder, folders first
//! - `folio stats <dir>` - Folder, file and size totals for a folder
//! - `folio precache <dir>` - Walk a whole tree and print per-folder totals
//! - `folio paths` - Manage content-indexed path prefixes
//! - `folio clear` - Delete the persisted index (and, with `--paths`, the path list)
//!
//! ## Example Usage
//!
//! ```bash
//! # Index every project under a root folder
//! folio index --root /srv/group-files/projects
//!
//! # Documents with a token starting with "inv" and one starting with "2024"
//! folio query inv 2024
//!
//! # Also index the text of files under a folder
//! folio paths add /srv/group-files/projects/Alpha/Docs
//! ```

mod app;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Folio - Project file search and browsing
#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or rebuild the search index
    Index {
        /// Projects root (defaults to general.projects_root from the config)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Search for files and folders
    #[command(alias = "q")]
    Query {
        /// Search terms; every term must prefix-match a token
        #[arg(required = true)]
        terms: Vec<String>,

        /// Maximum number of results to show
        #[arg(short, long, default_value = "100")]
        limit: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,

        /// Shorthand for --output json
        #[arg(long)]
        json: bool,
    },

    /// Show index status and statistics
    Status,

    /// List a folder
    Ls {
        /// Folder to list
        dir: PathBuf,

        /// Only show entries whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Show folder, file and size totals for a folder
    Stats {
        /// Folder to measure
        dir: PathBuf,
    },

    /// Walk a whole tree and print per-folder totals
    ///
    /// The folder cache is held in memory, so it is warm for this run only.
    Precache {
        /// Root of the tree
        dir: PathBuf,
    },

    /// Manage content-indexed path prefixes
    Paths {
        #[command(subcommand)]
        action: PathsAction,
    },

    /// Delete the persisted index
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Also delete the content-indexed path list
        #[arg(long)]
        paths: bool,
    },
}

#[derive(Subcommand)]
pub enum PathsAction {
    /// Show the configured prefixes
    List,
    /// Add a prefix
    Add { prefix: String },
    /// Remove a prefix
    Remove { prefix: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => folio_core::Config::load_from(path)?,
        None => folio_core::Config::load()?,
    };

    // Setup logging
    let log_level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.general.log_level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    // Execute command
    match cli.command {
        Commands::Index { root } => commands::index::run(config, root, cli.quiet),
        Commands::Query {
            terms,
            limit,
            output,
            json,
        } => {
            let output = if json { OutputFormat::Json } else { output };
            commands::query::run(config, &terms.join(" "), limit, output)
        }
        Commands::Status => commands::status::run(config),
        Commands::Ls {
            dir,
            filter,
            output,
        } => commands::ls::run(config, &dir, filter.as_deref(), output),
        Commands::Stats { dir } => commands::stats::run(config, &dir),
        Commands::Precache { dir } => commands::precache::run(config, &dir, cli.quiet),
        Commands::Paths { action } => commands::paths::run(config, action),
        Commands::Clear { yes, paths } => commands::clear::run(config, yes, paths),
    }
}
