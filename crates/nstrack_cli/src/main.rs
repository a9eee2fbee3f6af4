//! nstrack CLI
//!
//! Command-line tools for reconstructing star histories from simulation runs.
//!
//! # Commands
//!
//! - `segments` - List the save segments of a run directory
//! - `ingest` - Reconstruct a run and store its histories
//! - `inspect` - Show stored runs
//! - `report` - Print binned time summaries of stored runs
//! - `clear` - Drop a stored run

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// nstrack star-history tools.
#[derive(Parser)]
#[command(name = "nstrack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the history store directory
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
    /// List the save segments of a run directory
    Segments {
        /// Run directory
        run_dir: PathBuf,

        /// Pipeline configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Reconstruct a run and store its histories
    Ingest {
        /// Run directory
        run_dir: PathBuf,

        /// Name to store the run under (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Target stellar type code; repeatable
        #[arg(short = 't', long = "type")]
        types: Vec<i32>,

        /// Clear any stored histories of this run first
        #[arg(long)]
        replace: bool,

        /// Assemble segments one at a time
        #[arg(long)]
        sequential: bool,

        /// Reconstruct without writing to the store
        #[arg(long)]
        dry_run: bool,

        /// Pipeline configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show stored runs and document counts
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print binned time summaries of stored runs
    Report {
        /// Stored runs to combine
        #[arg(required = true)]
        runs: Vec<String>,

        /// Number of time bins
        #[arg(short, long, default_value = "50")]
        bins: usize,

        /// Target stellar type code; repeatable
        #[arg(short = 't', long = "type")]
        types: Vec<i32>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Drop a stored run
    Clear {
        /// Stored run name
        run: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Segments { run_dir, config } => {
            commands::segments::run(&run_dir, config.as_deref())?;
        }
        Commands::Ingest {
            run_dir,
            name,
            types,
            replace,
            sequential,
            dry_run,
            config,
        } => {
            let options = commands::ingest::IngestOptions {
                name,
                types,
                replace,
                sequential,
                dry_run,
                config,
            };
            let path = if dry_run {
                None
            } else {
                Some(cli.path.ok_or(commands::CliError::StorePathRequired("ingest"))?)
            };
            commands::ingest::run(path.as_deref(), &run_dir, &options)?;
        }
        Commands::Inspect { format } => {
            let path = cli.path.ok_or(commands::CliError::StorePathRequired("inspect"))?;
            commands::inspect::run(&path, commands::OutputFormat::parse(&format)?)?;
        }
        Commands::Report {
            runs,
            bins,
            types,
            format,
        } => {
            let path = cli.path.ok_or(commands::CliError::StorePathRequired("report"))?;
            commands::report::run(&path, &runs, bins, &types, commands::OutputFormat::parse(&format)?)?;
        }
        Commands::Clear { run } => {
            let path = cli.path.ok_or(commands::CliError::StorePathRequired("clear"))?;
            commands::clear::run(&path, &run)?;
        }
        Commands::Version => {
            println!("nstrack CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("nstrack Core v{}", nstrack_core::VERSION);
        }
    }

    Ok(())
}
