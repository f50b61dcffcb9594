//! classboard CLI
//!
//! Operator tools for classboard data directories.
//!
//! # Commands
//!
//! - `inspect` - Display document statistics and monthly standings
//! - `restore-points` - List the restore-point catalog
//! - `backup` - Export the current document to a file
//! - `restore` - Install a restore point as the live document
//! - `verify` - Run the corruption checks against the data directory
//! - `repair-fees` - Rebuild payment evidence from every backup

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// classboard command-line tools.
#[derive(Parser)]
#[command(name = "classboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long, default_value = "instance")]
    data_dir: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display document statistics and monthly standings
    Inspect {
        /// Month to summarize as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the restore-point catalog
    RestorePoints,

    /// Export the current document to a file
    Backup {
        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Install a restore point as the live document
    Restore {
        /// Restore point id (see restore-points)
        #[arg(short, long)]
        id: String,
    },

    /// Run the corruption checks against the data directory
    Verify,

    /// Rebuild payment evidence from every backup
    RepairFees {
        /// Show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { month, format } => {
            commands::inspect::run(&cli.data_dir, month.as_deref(), &format)?;
        }
        Commands::RestorePoints => {
            commands::restore_points::run(&cli.data_dir)?;
        }
        Commands::Backup { output } => {
            commands::backup::run(&cli.data_dir, &output)?;
        }
        Commands::Restore { id } => {
            commands::restore::run(&cli.data_dir, &id)?;
        }
        Commands::Verify => {
            commands::verify::run(&cli.data_dir)?;
        }
        Commands::RepairFees { dry_run } => {
            commands::repair_fees::run(&cli.data_dir, dry_run)?;
        }
        Commands::Version => {
            println!("classboard CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
