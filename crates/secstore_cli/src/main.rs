//! secstore CLI
//!
//! Maintenance tools for secure-object store media.
//!
//! # Commands
//!
//! - `clean` - zero-fill one raw slot or the whole store
//! - `dump` - walk the directory index and dump each object
//! - `verify` - validate every indexed object
//! - `version` - show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// secstore command-line maintenance tools.
#[derive(Parser)]
#[command(name = "secstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
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
    /// Zero-fill one raw slot or the whole store
    Clean {
        /// Slot number, or "all" for every slot
        target: String,
    },

    /// Walk the directory index and dump each object's validated contents
    Dump {
        /// List backend-native names instead of parsing the index
        #[arg(short, long)]
        raw: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate every indexed object without dumping contents
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
        Commands::Clean { target } => {
            let path = cli.path.ok_or("store path required for clean")?;
            commands::clean::run(&path, &target)?;
        }
        Commands::Dump { raw, format } => {
            let path = cli.path.ok_or("store path required for dump")?;
            commands::dump::run(&path, raw, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("store path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Version => {
            println!("secstore {}", env!("CARGO_PKG_VERSION"));
            println!("envelope format version {}", secstore_codec::FORMAT_VERSION);
        }
    }

    Ok(())
}
