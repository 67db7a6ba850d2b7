//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the papers3-zotero configuration file.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::config::{parse_config, MigrationConfig};
use clap::Args;
use std::path::Path;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match read_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        match config.validate() {
            Ok(()) => {
                println!("✅ Configuration is valid");
                println!();
                print_summary(&config);
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(EXIT_CONFIG)
            }
        }
    }
}

/// Reads and parses without validating, so validation errors are reported
/// separately from syntax errors.
fn read_config(path: &str) -> crate::domain::Result<MigrationConfig> {
    let contents = std::fs::read_to_string(Path::new(path)).map_err(|e| {
        crate::domain::MigrationError::Configuration(format!("Failed to read {path}: {e}"))
    })?;
    parse_config(&contents)
}

fn print_summary(config: &MigrationConfig) {
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  Catalog: {}", config.source.catalog_dir.display());
    match &config.source.attachments_root {
        Some(root) => println!("  Attachments Root: {}", root.display()),
        None => println!("  Attachments Root: (paths used as given)"),
    }
    println!("  Store: {}", config.store.path.display());
    println!("  Library ID: {}", config.store.library_id);
    println!("  Dry Run: {}", config.import.dry_run);
    match config.import.limit {
        Some(limit) => println!("  Limit: {limit}"),
        None => println!("  Limit: none"),
    }
    println!("  Skip Attachments: {}", config.import.skip_attachments);
    println!("  Files Only: {}", config.import.files_only);
    match config.organize_root() {
        Some(root) => println!("  Organize Files To: {}", root.display()),
        None => println!("  Organize Files: no"),
    }
    println!();
}
