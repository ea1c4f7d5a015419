//! Hmily CLI
//!
//! Command-line tools for file-backed Hmily transaction repositories.
//!
//! # Commands
//!
//! - `inspect` - Display record counts and repository layout
//! - `list` - Dump stored records of one kind
//! - `purge` - Remove old soft-deleted records
//! - `verify` - Report record files that cannot be decoded

mod commands;

use clap::{Parser, Subcommand};
use commands::{RecordKindArg, Target};
use hmily_serializer::SerializerKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Hmily transaction repository tools.
#[derive(Parser)]
#[command(name = "hmily")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository root (the directory holding `hmily/`)
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Application whose participants and undo records to read
    #[arg(global = true, short, long)]
    app: Option<String>,

    /// Record format (cbor, json)
    #[arg(global = true, short, long, default_value = "cbor")]
    serializer: SerializerKind,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display record counts and repository layout
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Dump stored records of one kind
    List {
        /// Record kind to list
        #[arg(value_enum)]
        kind: RecordKindArg,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Remove soft-deleted records not updated recently
    Purge {
        /// Only records last updated more than this many seconds ago
        #[arg(long, default_value = "0")]
        older_than_secs: u64,

        /// Dry run - count what would be removed
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Report record files that cannot be decoded
    Verify,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let target = |command: &str| -> Result<Target, Box<dyn std::error::Error>> {
        let path = cli
            .path
            .clone()
            .ok_or(format!("Repository path required for {command}"))?;
        let app = cli
            .app
            .clone()
            .ok_or(format!("Application name required for {command}"))?;
        Ok(Target::new(path, app, cli.serializer))
    };

    match &cli.command {
        Commands::Inspect { format } => {
            commands::inspect::run(&target("inspect")?, format)?;
        }
        Commands::List {
            kind,
            limit,
            format,
        } => {
            commands::list::run(&target("list")?, *kind, *limit, format)?;
        }
        Commands::Purge {
            older_than_secs,
            dry_run,
        } => {
            commands::purge::run(&target("purge")?, *older_than_secs, *dry_run)?;
        }
        Commands::Verify => {
            commands::verify::run(&target("verify")?)?;
        }
        Commands::Version => {
            println!("Hmily CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Hmily Repository v{}", hmily_repository::VERSION);
        }
    }

    Ok(())
}
