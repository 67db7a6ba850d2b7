//! Fix-keys command implementation
//!
//! This module implements the `fix-keys` command, which replaces malformed
//! item and collection keys in the Zotero store.

use super::{exit_code_for, EXIT_FATAL, EXIT_OK};
use crate::adapters::zotero::ZoteroStore;
use crate::config::load_config;
use crate::core::repair::{repair_keys, RepairReport};
use clap::Args;

/// Arguments for the fix-keys command
#[derive(Args, Debug, Default)]
pub struct FixKeysArgs {
    /// Report invalid keys without replacing them
    #[arg(long)]
    pub dry_run: bool,
}

impl FixKeysArgs {
    /// Execute the fix-keys command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(dry_run = self.dry_run, "Starting key repair");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let mut store = match ZoteroStore::open(&config.store).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open store");
                eprintln!("Failed to open store: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let result = repair_keys(&mut store, self.dry_run).await;
        let closed = store.close().await;

        let report = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Key repair failed");
                eprintln!("Key repair failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };
        closed?;

        print_report(&report);
        if report.dry_run || report.is_clean() {
            Ok(EXIT_OK)
        } else {
            Ok(EXIT_FATAL)
        }
    }
}

fn print_report(report: &RepairReport) {
    println!();
    println!("🔑 Key Repair Report:");
    for table in &report.tables {
        println!(
            "  {}: {} invalid, {} fixed",
            table.table, table.invalid_found, table.fixed
        );
    }
    println!();

    if report.dry_run {
        if report.invalid_found() == 0 {
            println!("✅ All keys are valid");
        } else {
            println!(
                "🔍 DRY RUN - {} keys would be replaced",
                report.invalid_found()
            );
        }
        return;
    }

    if !report.duplicate_keys.is_empty() {
        println!("❌ Duplicate keys found:");
        for key in &report.duplicate_keys {
            println!("  - {key}");
        }
    }
    if report.remaining_invalid > 0 {
        println!("❌ {} invalid keys remain", report.remaining_invalid);
    }
    if report.is_clean() {
        println!("✅ All keys are valid and unique");
    }
}
