//! Ordex CLI
//!
//! Command-line tools for inspecting Ordex stores and their indexes.
//!
//! # Commands
//!
//! - `buckets` - List buckets and their entry counts
//! - `dump` - Print the entries of one bucket
//! - `lookup` - Resolve an indexed value to item keys
//! - `genkey` - Generate item keys
//! - `verify` - Check every commit log record

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ordex command-line store tools.
#[derive(Parser)]
#[command(name = "ordex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List buckets and their entry counts
    Buckets {
        /// Only list index buckets
        #[arg(short, long)]
        indexes: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the entries of one bucket
    Dump {
        /// Bucket name
        bucket: String,

        /// Maximum number of entries to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Resolve an indexed value to item keys
    Lookup {
        /// Index name, without the index bucket prefix
        index: String,

        /// Value to look up
        value: String,

        /// Treat the index as unique
        #[arg(short, long)]
        unique: bool,

        /// Encode the value as a sortable integer instead of text
        #[arg(short, long)]
        numeric: bool,

        /// Treat the value as an inclusive lower bound up to this value
        #[arg(long)]
        to: Option<String>,

        /// Maximum number of keys to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Generate item keys
    Genkey {
        /// Number of keys to generate
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Keep keys strictly ordered within a millisecond
        #[arg(short, long)]
        monotonic: bool,
    },

    /// Check every commit log record
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

    match cli.command {
        Commands::Buckets { indexes, format } => {
            let path = cli.path.ok_or("Store path required for buckets")?;
            commands::buckets::run(&path, indexes, &format)?;
        }
        Commands::Dump {
            bucket,
            limit,
            format,
        } => {
            let path = cli.path.ok_or("Store path required for dump")?;
            commands::dump::run(&path, &bucket, limit, &format)?;
        }
        Commands::Lookup {
            index,
            value,
            unique,
            numeric,
            to,
            limit,
            format,
        } => {
            let path = cli.path.ok_or("Store path required for lookup")?;
            let query = commands::lookup::Query {
                index,
                value,
                to,
                unique,
                numeric,
                limit,
            };
            commands::lookup::run(&path, &query, &format)?;
        }
        Commands::Genkey { count, monotonic } => {
            commands::genkey::run(count, monotonic)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Version => {
            println!("Ordex CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Commit log format v{}", ordex_storage::log::LOG_VERSION);
        }
    }

    Ok(())
}
