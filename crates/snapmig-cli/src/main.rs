//! snapmig CLI
//!
//! Command-line access to the snapshot bootstrap for test scripts that do not
//! link the library.

use clap::{Parser, Subcommand};
use snapmig_core::logging_facility::{init, Profile};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "snapmig")]
#[command(about = "Snapshot-cached test database migrations", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./snapmig.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Report whether the snapshot is fresh, missing or stale
    Status,
    /// Restore from the snapshot, or migrate and rewrite it when stale
    Prepare(commands::PrepareArgs),
    /// Print the effective connection parameters (password redacted)
    Resolve,
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init(Profile::Development);
    }

    let result = commands::load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Status => commands::status(config),
        Commands::Prepare(args) => commands::prepare(config, args),
        Commands::Resolve => commands::resolve(config),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
