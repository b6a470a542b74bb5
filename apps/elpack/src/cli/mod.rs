//! # elpack CLI Module
//!
//! This module implements the CLI interface for elpack.
//!
//! ## Available Commands
//!
//! - `detect` - Print the standard a package follows
//! - `inspect` - Print package metadata (text or JSON)
//! - `launch` - Print the launch URL
//! - `prereq` - Evaluate an AICC prerequisite expression

mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use elpack_core::PackageError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// elpack - e-learning package inspector
///
/// Reads SCORM 1.2, SCORM 2004, AICC, cmi5 and xAPI packages extracted to
/// a directory.
#[derive(Parser, Debug)]
#[command(name = "elpack")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Parser options file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the package standard
    Detect {
        /// Package directory
        path: PathBuf,
    },

    /// Show package metadata
    Inspect {
        /// Package directory
        path: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the launch URL
    Launch {
        /// Package directory
        path: PathBuf,
    },

    /// Evaluate an AICC prerequisite expression
    Prereq {
        /// Expression, e.g. "A1 & (A2 | ~A3)"
        expression: String,

        /// Completed structure elements (comma-separated)
        #[arg(long, value_delimiter = ',')]
        completed: Vec<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), PackageError> {
    let Some(command) = cli.command else {
        Cli::command()
            .print_help()
            .map_err(|e| PackageError::Io(e.to_string()))?;
        return Ok(());
    };

    let options = || crate::config::load(cli.config.as_deref());
    let output = match command {
        Commands::Detect { path } => cmd_detect(&path, &options()?)?,
        Commands::Inspect { path, json } => cmd_inspect(&path, &options()?, json)?,
        Commands::Launch { path } => cmd_launch(&path, &options()?)?,
        Commands::Prereq {
            expression,
            completed,
        } => cmd_prereq(&expression, &completed)?,
    };
    println!("{}", output);
    Ok(())
}
