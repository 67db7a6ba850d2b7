//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for papers3-zotero using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Papers3-Zotero - Papers3 library migration into a Zotero store
#[derive(Parser, Debug)]
#[command(name = "papers3-zotero")]
#[command(version, about, long_about = None)]
#[command(author = "Papers3-Zotero Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "papers3-zotero.toml",
        env = "P3Z_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "P3Z_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import the exported Papers3 library into the Zotero store
    Import(commands::import::ImportArgs),

    /// Replace malformed item and collection keys in the Zotero store
    FixKeys(commands::fix_keys::FixKeysArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}
