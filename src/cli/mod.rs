//! CLI module for the encode supervisor
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// Encode supervisor
///
/// Runs the external video encoder, reports its progress and watches its
/// heartbeat.
#[derive(Parser, Debug)]
#[command(name = "encsup")]
#[command(about = "Encode supervisor - Run and watch the external video encoder")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: encsup.toml, then config/encsup.toml)
    #[arg(long, env = "ENCSUP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level, overrides config and ENCSUP_LOG_LEVEL
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
    /// Run one supervised encode
    Encode(args::EncodeArgs),
    /// Play an encoded file
    Preview(args::PreviewArgs),
    /// Print the encoder argument line without running it
    Args(args::ArgsArgs),
}
