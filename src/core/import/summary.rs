//! Import summary and reporting
//!
//! This module defines structures for tracking and reporting import results.

use crate::core::intern::InternStats;
use crate::domain::Result;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where in the run an error was caught
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportErrorKind {
    /// A publication was skipped
    Record,
    /// A collection subtree was skipped
    Collection,
    /// An attachment file could not be placed or recorded
    File,
}

/// An error with the source identifier it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportError {
    pub kind: ImportErrorKind,
    pub source_id: String,
    pub message: String,
}

impl ImportError {
    pub fn new(kind: ImportErrorKind, source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            source_id: source_id.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.kind {
            ImportErrorKind::Record => "Publication",
            ImportErrorKind::Collection => "Collection",
            ImportErrorKind::File => "File",
        };
        write!(f, "{label} {}: {}", self.source_id, self.message)
    }
}

/// Attachment file counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    /// Source files that exist
    pub found: usize,
    /// Files copied into the organized tree
    pub copied: usize,
    /// Files whose content was already at the destination
    pub duplicates: usize,
    /// Source files that do not exist
    pub missing: usize,
    /// Copies that failed
    pub failed: usize,
}

/// How the run's transaction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Committed,
    /// Dry run: everything was processed, then rolled back
    RolledBack,
    /// A shutdown signal stopped the loop; everything was rolled back
    Interrupted,
    /// No store was touched
    FilesOnly,
}

/// Summary of an import run
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub outcome: RunOutcome,
    pub dry_run: bool,

    /// Publications considered (after the record cap)
    pub total_records: usize,
    pub records_imported: usize,
    pub records_failed: usize,
    pub attachments_created: usize,

    pub collections_created: usize,
    pub collections_reused: usize,

    pub creators_created: usize,
    pub tags_created: usize,
    pub values_created: usize,

    pub files: FileStats,

    #[serde(skip)]
    pub duration: Duration,

    /// Record and collection errors, in the order they happened
    pub errors: Vec<ImportError>,

    /// Per-file errors, kept apart from record errors
    pub file_errors: Vec<ImportError>,

    /// Every missing source path
    pub missing_files: Vec<PathBuf>,
}

impl ImportSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            outcome: RunOutcome::RolledBack,
            dry_run,
            total_records: 0,
            records_imported: 0,
            records_failed: 0,
            attachments_created: 0,
            collections_created: 0,
            collections_reused: 0,
            creators_created: 0,
            tags_created: 0,
            values_created: 0,
            files: FileStats::default(),
            duration: Duration::ZERO,
            errors: Vec::new(),
            file_errors: Vec::new(),
            missing_files: Vec::new(),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_error(&mut self, error: ImportError) {
        self.errors.push(error);
    }

    pub fn add_file_error(&mut self, error: ImportError) {
        self.file_errors.push(error);
    }

    pub fn apply_intern_stats(&mut self, stats: InternStats) {
        self.creators_created = stats.creators_created;
        self.tags_created = stats.tags_created;
        self.values_created = stats.values_created;
    }

    pub fn interrupted(&self) -> bool {
        self.outcome == RunOutcome::Interrupted
    }

    /// True when nothing was skipped
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty() && !self.interrupted()
    }

    /// The first `limit` errors and how many more there are
    pub fn displayed_errors(&self, limit: usize) -> (&[ImportError], usize) {
        let shown = self.errors.len().min(limit);
        (&self.errors[..shown], self.errors.len() - shown)
    }

    /// Writes every missing source path, one per line.
    ///
    /// When no file is missing, a list left by an earlier run is removed.
    pub fn write_missing_log(&self, path: &Path) -> Result<()> {
        if self.missing_files.is_empty() {
            if path.exists() {
                std::fs::remove_file(path)?;
                tracing::debug!(file = %path.display(), "Stale missing file list removed");
            }
            return Ok(());
        }
        let mut file = std::fs::File::create(path)?;
        for missing in &self.missing_files {
            writeln!(file, "{}", missing.display())?;
        }
        tracing::info!(
            file = %path.display(),
            count = self.missing_files.len(),
            "Missing file list written"
        );
        Ok(())
    }

    /// Log the summary, showing at most `error_limit` errors
    pub fn log_summary(&self, error_limit: usize) {
        tracing::info!(
            outcome = ?self.outcome,
            dry_run = self.dry_run,
            records = self.total_records,
            imported = self.records_imported,
            failed = self.records_failed,
            attachments = self.attachments_created,
            collections_created = self.collections_created,
            collections_reused = self.collections_reused,
            creators_created = self.creators_created,
            tags_created = self.tags_created,
            duration_secs = self.duration.as_secs(),
            "Import finished"
        );
        tracing::info!(
            found = self.files.found,
            copied = self.files.copied,
            duplicates = self.files.duplicates,
            missing = self.files.missing,
            failed = self.files.failed,
            "Attachment files"
        );

        if !self.errors.is_empty() {
            let (shown, remaining) = self.displayed_errors(error_limit);
            tracing::warn!(error_count = self.errors.len(), "Import completed with errors");
            for error in shown {
                tracing::warn!(
                    kind = ?error.kind,
                    source_id = %error.source_id,
                    message = %error.message,
                    "Import error"
                );
            }
            if remaining > 0 {
                tracing::warn!(remaining, "... and more errors");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record_error(i: usize) -> ImportError {
        ImportError::new(ImportErrorKind::Record, format!("P-{i}"), "boom")
    }

    #[test]
    fn test_new_summary() {
        let summary = ImportSummary::new(true);
        assert!(summary.dry_run);
        assert_eq!(summary.outcome, RunOutcome::RolledBack);
        assert!(summary.is_successful());
    }

    #[test]
    fn test_displayed_errors_are_capped() {
        let mut summary = ImportSummary::new(false);
        for i in 0..13 {
            summary.add_error(record_error(i));
        }
        let (shown, remaining) = summary.displayed_errors(10);
        assert_eq!(shown.len(), 10);
        assert_eq!(remaining, 3);
        assert_eq!(shown[0].source_id, "P-0");
        assert!(!summary.is_successful());
    }

    #[test]
    fn test_displayed_errors_under_cap() {
        let mut summary = ImportSummary::new(false);
        summary.add_error(record_error(1));
        let (shown, remaining) = summary.displayed_errors(10);
        assert_eq!(shown.len(), 1);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_file_errors_do_not_fail_the_run() {
        let mut summary = ImportSummary::new(false);
        summary.add_file_error(ImportError::new(ImportErrorKind::File, "P-1", "missing"));
        assert!(summary.is_successful());
    }

    #[test]
    fn test_error_display() {
        let error = ImportError::new(ImportErrorKind::Collection, "C-9", "no name");
        assert_eq!(error.to_string(), "Collection C-9: no name");
    }

    #[test]
    fn test_write_missing_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.log");

        let mut summary = ImportSummary::new(false);
        summary.write_missing_log(&path).unwrap();
        assert!(!path.exists());

        summary.missing_files.push(PathBuf::from("/a/one.pdf"));
        summary.missing_files.push(PathBuf::from("/b/two.pdf"));
        summary.write_missing_log(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "/a/one.pdf\n/b/two.pdf\n");
    }

    #[test]
    fn test_clean_run_removes_stale_missing_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.log");
        std::fs::write(&path, "/old/run.pdf\n").unwrap();

        ImportSummary::new(false).write_missing_log(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_summary_serializes() {
        let summary = ImportSummary::new(false);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["outcome"], "rolled_back");
        assert_eq!(json["files"]["copied"], 0);
    }
}
