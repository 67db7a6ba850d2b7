//! Import command implementation
//!
//! This module implements the `import` command, which migrates the exported
//! Papers3 library into the Zotero store or, with `--files-only`, only
//! organizes attachment files.

use super::{exit_code_for, EXIT_CONFIG, EXIT_INTERRUPTED, EXIT_OK, EXIT_RECORD_ERRORS};
use crate::config::{load_config, MigrationConfig};
use crate::core::import::{ImportCoordinator, ImportSummary, RunOutcome};
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the import command
#[derive(Args, Debug, Default)]
pub struct ImportArgs {
    /// Process everything, then roll back
    #[arg(long)]
    pub dry_run: bool,

    /// Import at most this many publications
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub limit: Option<usize>,

    /// Do not create attachment records
    #[arg(long)]
    pub skip_attachments: bool,

    /// Organize attachment files without touching the store
    #[arg(long)]
    pub files_only: bool,

    /// Copy attachments into a year/author/title tree under this directory
    #[arg(long, value_name = "DIR")]
    pub organize_to: Option<PathBuf>,
}

impl ImportArgs {
    /// Execute the import command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting import command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        if config.import.dry_run {
            tracing::info!("Dry run mode enabled - all changes will be rolled back");
            println!("🔍 DRY RUN MODE - The store is left unchanged");
            println!();
        }

        let error_limit = config.import.error_display_limit;
        let coordinator = ImportCoordinator::new(config, shutdown_signal);

        println!("🚀 Starting import...");
        println!();

        let summary = match coordinator.execute().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Import failed");
                eprintln!("Import failed: {e}");
                if !e.is_fatal_setup() {
                    eprintln!("All changes were rolled back.");
                }
                return Ok(exit_code_for(&e));
            }
        };

        print_summary(&summary, error_limit);
        Ok(exit_code(&summary))
    }

    fn apply_overrides(&self, config: &mut MigrationConfig) {
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.import.dry_run = true;
        }
        if let Some(limit) = self.limit {
            tracing::info!(limit, "Overriding record limit from CLI");
            config.import.limit = Some(limit);
        }
        if self.skip_attachments {
            tracing::info!("Skipping attachments from CLI");
            config.import.skip_attachments = true;
        }
        if self.files_only {
            tracing::info!("Enabling files-only mode from CLI");
            config.import.files_only = true;
        }
        if let Some(root) = &self.organize_to {
            tracing::info!(target_root = %root.display(), "Organizing files from CLI");
            config.files.organize = true;
            config.files.target_root = Some(root.clone());
        }
    }
}

fn exit_code(summary: &ImportSummary) -> i32 {
    if summary.interrupted() {
        EXIT_INTERRUPTED
    } else if summary.records_failed > 0 || !summary.errors.is_empty() {
        EXIT_RECORD_ERRORS
    } else {
        EXIT_OK
    }
}

fn print_summary(summary: &ImportSummary, error_limit: usize) {
    println!();
    println!("📊 Import Summary:");
    if summary.outcome != RunOutcome::FilesOnly {
        println!("  Publications: {}", summary.total_records);
        println!("  Imported: {}", summary.records_imported);
        println!("  Failed: {}", summary.records_failed);
        println!("  Attachments: {}", summary.attachments_created);
        println!(
            "  Collections: {} created, {} reused",
            summary.collections_created, summary.collections_reused
        );
        println!("  Creators Created: {}", summary.creators_created);
        println!("  Tags Created: {}", summary.tags_created);
    }
    println!(
        "  Files: {} found, {} copied, {} duplicates, {} missing, {} failed",
        summary.files.found,
        summary.files.copied,
        summary.files.duplicates,
        summary.files.missing,
        summary.files.failed
    );
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    if !summary.errors.is_empty() {
        let (shown, remaining) = summary.displayed_errors(error_limit);
        println!("⚠️  Errors encountered:");
        for error in shown {
            println!("  - {error}");
        }
        if remaining > 0 {
            println!("  ... and {remaining} more errors");
        }
        println!();
    }

    match summary.outcome {
        RunOutcome::Interrupted => {
            println!("⚠️  Import interrupted. All changes were rolled back.");
            println!("   Run the same command again to start over.");
        }
        RunOutcome::RolledBack => {
            println!("✅ Dry run completed. No changes were written.");
        }
        RunOutcome::FilesOnly => {
            println!("✅ File organization completed.");
        }
        RunOutcome::Committed if summary.is_successful() => {
            println!("✅ Import completed successfully!");
        }
        RunOutcome::Committed => {
            println!("⚠️  Import completed with errors");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::core::import::{ImportError, ImportErrorKind};

    fn base_config() -> MigrationConfig {
        parse_config("[store]\npath = \"zotero.sqlite\"\n").unwrap()
    }

    #[test]
    fn test_import_args_defaults() {
        let args = ImportArgs::default();
        let mut config = base_config();
        args.apply_overrides(&mut config);

        assert!(!config.import.dry_run);
        assert!(config.import.limit.is_none());
        assert!(!config.files.organize);
    }

    #[test]
    fn test_import_args_with_overrides() {
        let args = ImportArgs {
            dry_run: true,
            limit: Some(50),
            organize_to: Some(PathBuf::from("/tmp/papers")),
            ..Default::default()
        };
        let mut config = base_config();
        args.apply_overrides(&mut config);

        assert!(config.import.dry_run);
        assert_eq!(config.import.limit, Some(50));
        assert!(config.files.organize);
        assert_eq!(config.files.target_root, Some(PathBuf::from("/tmp/papers")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_conflicting_overrides_fail_validation() {
        let args = ImportArgs {
            skip_attachments: true,
            organize_to: Some(PathBuf::from("/tmp/papers")),
            ..Default::default()
        };
        let mut config = base_config();
        args.apply_overrides(&mut config);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exit_code_reflects_outcome() {
        let mut summary = ImportSummary::new(false);
        summary.outcome = RunOutcome::Committed;
        assert_eq!(exit_code(&summary), EXIT_OK);

        summary.records_failed = 1;
        summary.add_error(ImportError::new(ImportErrorKind::Record, "A1", "boom"));
        assert_eq!(exit_code(&summary), EXIT_RECORD_ERRORS);

        summary.outcome = RunOutcome::Interrupted;
        assert_eq!(exit_code(&summary), EXIT_INTERRUPTED);
    }
}
