//! Import coordinator - main orchestrator for a migration run
//!
//! A run moves through these stages:
//!
//! 1. Load the document set (fatal if the publications file is absent)
//! 2. Open the store, read its vocabularies, seed the key generator
//! 3. Begin the run-wide transaction
//! 4. Import the collection tree
//! 5. Import publications one by one, each in its own savepoint
//! 6. Commit, or roll back for dry runs and interruptions
//! 7. Report
//!
//! An error that escapes stage 4 or 5 rolls back everything and is returned
//! to the caller. The partial summary and the missing file list are still
//! reported first. The store connection is closed on every path.

use super::record::{self, RecordImporter, RecordOutcome};
use super::summary::{ImportError, ImportErrorKind, ImportSummary, RunOutcome};
use crate::adapters::papers3::{load_document_set, DocumentEntry, DocumentSet};
use crate::adapters::zotero::{transaction_failed, Vocabulary, ZoteroStore};
use crate::config::MigrationConfig;
use crate::core::collections::import_tree;
use crate::core::files::{FileMeta, FileOrganizer};
use crate::core::keys::KeyGenerator;
use crate::domain::{MigrationError, Result};
use crate::{log_import_complete, log_import_start, log_progress, log_record_failed};
use sqlx::SqliteConnection;
use std::time::Instant;
use tokio::sync::watch;

/// Publications between two progress log lines
const PROGRESS_INTERVAL: usize = 100;

/// Import coordinator
pub struct ImportCoordinator {
    config: MigrationConfig,
    shutdown_signal: watch::Receiver<bool>,
}

impl ImportCoordinator {
    /// Create a new import coordinator
    pub fn new(config: MigrationConfig, shutdown_signal: watch::Receiver<bool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Execute the import
    ///
    /// # Errors
    ///
    /// - Setup failures ([`MigrationError::is_fatal_setup`]) before any write
    /// - Unrecoverable store failures, after the transaction was rolled back
    pub async fn execute(&self) -> Result<ImportSummary> {
        let start_time = Instant::now();
        self.config
            .validate()
            .map_err(MigrationError::Configuration)?;

        let mut documents = load_document_set(&self.config.source.catalog_dir)?;
        documents.truncate(self.config.import.limit);

        let mut summary = ImportSummary::new(self.config.import.dry_run);
        summary.total_records = documents.publications.len();
        log_import_start!(summary.total_records, self.config.import.dry_run);

        if self.config.import.files_only {
            self.organize_files(&documents, &mut summary);
        } else {
            let mut store = ZoteroStore::open(&self.config.store).await?;
            let result = self.run_import(&mut store, &documents, &mut summary).await;
            let closed = store.close().await;
            if result.is_err() {
                summary.outcome = RunOutcome::RolledBack;
            }
            if let Err(e) = result.and(closed) {
                summary = summary.with_duration(start_time.elapsed());
                self.report(&summary);
                return Err(e);
            }
        }

        summary = summary.with_duration(start_time.elapsed());
        self.report(&summary);
        Ok(summary)
    }

    async fn run_import(
        &self,
        store: &mut ZoteroStore,
        documents: &DocumentSet,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let vocabulary = Vocabulary::load(store.connection()).await?;
        let mut keys = KeyGenerator::new();
        keys.seed_from_store(store.connection()).await?;
        let library_id = store.library_id();

        let mut tx = store.begin().await?;
        if let Err(e) = self
            .import_all(&mut tx, documents, vocabulary, keys, library_id, summary)
            .await
        {
            tracing::error!(error = %e, "Unrecoverable error; rolling back the whole import");
            if let Err(rollback) = tx.rollback().await {
                tracing::error!(error = %rollback, "Rollback failed");
            }
            return Err(e);
        }

        if summary.outcome == RunOutcome::Interrupted {
            tx.rollback().await.map_err(transaction_failed("rollback"))?;
            tracing::warn!("Import interrupted; all changes rolled back");
        } else if self.config.import.dry_run {
            tx.rollback().await.map_err(transaction_failed("rollback"))?;
            summary.outcome = RunOutcome::RolledBack;
            tracing::info!("Dry run; all changes rolled back");
        } else {
            tx.commit().await.map_err(transaction_failed("commit"))?;
            summary.outcome = RunOutcome::Committed;
            tracing::info!("Import committed");
        }
        Ok(())
    }

    async fn import_all(
        &self,
        conn: &mut SqliteConnection,
        documents: &DocumentSet,
        vocabulary: Vocabulary,
        mut keys: KeyGenerator,
        library_id: i64,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let hierarchy = import_tree(conn, &documents.collections, library_id, &mut keys).await?;
        summary.collections_created = hierarchy.created;
        summary.collections_reused = hierarchy.reused;
        summary.errors.extend(hierarchy.failures);

        let mut importer = RecordImporter::new(
            library_id,
            vocabulary,
            hierarchy.id_map,
            keys,
            FileOrganizer::from_config(&self.config),
            self.config.import.skip_attachments,
        );

        let records = self
            .import_records(conn, documents, &mut importer, summary)
            .await;

        summary.apply_intern_stats(importer.intern_stats());
        summary.files = importer.organizer().stats();
        summary.missing_files = importer.organizer_mut().take_missing();
        records
    }

    async fn import_records(
        &self,
        conn: &mut SqliteConnection,
        documents: &DocumentSet,
        importer: &mut RecordImporter,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let total = documents.publications.len();
        for (i, entry) in documents.publications.iter().enumerate() {
            if self.shutdown_requested() {
                tracing::warn!(processed = i, total, "Shutdown requested; stopping import");
                summary.outcome = RunOutcome::Interrupted;
                break;
            }

            let outcome = match entry {
                DocumentEntry::Valid(doc) => importer.import(conn, doc).await?,
                DocumentEntry::Malformed { reason, .. } => record::malformed(entry.label(), reason),
            };
            match outcome {
                RecordOutcome::Imported {
                    attachments,
                    file_errors,
                    ..
                } => {
                    summary.records_imported += 1;
                    summary.attachments_created += attachments;
                    summary.file_errors.extend(file_errors);
                }
                RecordOutcome::Failed { source_id, reason } => {
                    log_record_failed!(source_id, reason);
                    summary.records_failed += 1;
                    summary.add_error(ImportError::new(ImportErrorKind::Record, source_id, reason));
                }
            }

            if (i + 1) % PROGRESS_INTERVAL == 0 {
                log_progress!(i + 1, total);
            }
        }
        Ok(())
    }

    /// Organizes attachment files without touching the store.
    fn organize_files(&self, documents: &DocumentSet, summary: &mut ImportSummary) {
        let mut organizer = FileOrganizer::from_config(&self.config);
        summary.outcome = RunOutcome::FilesOnly;

        for entry in &documents.publications {
            if self.shutdown_requested() {
                tracing::warn!("Shutdown requested; stopping file organization");
                summary.outcome = RunOutcome::Interrupted;
                break;
            }
            let DocumentEntry::Valid(doc) = entry else {
                continue;
            };
            let meta = FileMeta::from_document(doc);
            for attachment in &doc.attachments {
                let outcome = organizer.resolve(&attachment.path, &meta);
                if outcome.stored_path().is_none() {
                    summary.add_file_error(record::file_error(doc.uuid.as_str(), &outcome));
                }
            }
        }

        summary.files = organizer.stats();
        summary.missing_files = organizer.take_missing();
    }

    fn report(&self, summary: &ImportSummary) {
        log_import_complete!(
            summary.records_imported,
            summary.records_failed,
            summary.duration
        );
        summary.log_summary(self.config.import.error_display_limit);
        if let Err(e) = summary.write_missing_log(&self.config.files.missing_log) {
            tracing::warn!(
                file = %self.config.files.missing_log.display(),
                error = %e,
                "Could not write the missing file list"
            );
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown_signal.borrow()
    }
}
