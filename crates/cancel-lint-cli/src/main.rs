//! cancel-lint CLI tool.
//!
//! Usage:
//! ```bash
//! cancel-lint check [OPTIONS] [PATH]
//! cancel-lint fix [--codes CT003,CT004] [--write] [PATH]
//! cancel-lint list-rules
//! cancel-lint init
//! ```
//!
//! `PATH` is a compilation JSON file or a directory searched for them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Finds asynchronous C# code that drops its CancellationToken
#[derive(Parser)]
#[command(name = "cancel-lint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run lint checks
    Check {
        /// Compilation file or directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Apply the preferred fix for each diagnostic
    Fix {
        /// Compilation file or directory (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Only fix specific rule codes (comma-separated)
        #[arg(long)]
        codes: Option<String>,

        /// Write fixed documents back instead of printing them
        #[arg(short, long)]
        write: bool,
    },

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-diagnostic compact format.
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check { path, format } => commands::check::run(&path, format, cli.config.as_deref()),
        Commands::Fix { path, codes, write } => {
            commands::fix::run(&path, codes, write, cli.config.as_deref())
        }
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(())
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
