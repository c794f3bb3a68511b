//! CLI module for TrimFit
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::adapters::{init_logging, AppConfig};

pub mod args;
pub mod commands;

pub use args::{ConvertArgs, InspectArgs, PlanArgs};

/// TrimFit video trimmer
///
/// Cuts a section out of a video and re-encodes it until the result fits
/// under a hard file-size budget.
#[derive(Parser, Debug)]
#[command(name = "trimfit")]
#[command(about = "TrimFit - Trim a clip and squeeze it under a size limit")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./trimfit.toml when present)
    #[arg(long, global = true, env = "TRIMFIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trim a clip and encode it under the size budget
    Convert(ConvertArgs),
    /// Show what the analyzer sees in a video file
    Inspect(InspectArgs),
    /// Show the first encode plan without encoding
    Plan(PlanArgs),
}

/// Load configuration, start logging and run the selected command
pub async fn run(cli: Cli) -> Result<()> {
    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(level) = &cli.log_level {
        config.logging.level = level.trim().to_ascii_lowercase();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    config.validate()?;

    init_logging(&config.logging.level, config.logging.json);
    debug!(config = ?config, "Configuration resolved");

    match cli.command {
        Commands::Convert(args) => commands::convert(args, config).await,
        Commands::Inspect(args) => commands::inspect(args, config).await,
        Commands::Plan(args) => commands::plan(args, config).await,
    }
}
