//! Logging and observability
//!
//! Structured logging through `tracing`, with a console layer and an optional
//! rotating JSON file. The macros below keep the field names of recurring
//! events consistent across the import and repair paths.
//!
//! # Example
//!
//! ```no_run
//! use papers3_zotero::logging::init_logging;
//! use papers3_zotero::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an import run
///
/// # Example
///
/// ```no_run
/// use papers3_zotero::log_import_start;
///
/// log_import_start!(1200, true);
/// ```
#[macro_export]
macro_rules! log_import_start {
    ($documents:expr, $dry_run:expr) => {
        tracing::info!(
            documents = $documents,
            dry_run = $dry_run,
            "Starting import"
        );
    };
}

/// Log the completion of an import run
///
/// # Example
///
/// ```no_run
/// use papers3_zotero::log_import_complete;
/// use std::time::Duration;
///
/// log_import_complete!(42, 1, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_import_complete {
    ($imported:expr, $failed:expr, $duration:expr) => {
        tracing::info!(
            imported = $imported,
            failed = $failed,
            duration_ms = $duration.as_millis() as u64,
            "Import completed"
        );
    };
}

/// Log a skipped record together with its source identifier
///
/// # Example
///
/// ```no_run
/// use papers3_zotero::log_record_failed;
///
/// log_record_failed!("6A1E4C1F", "field 'title' missing from vocabulary");
/// ```
#[macro_export]
macro_rules! log_record_failed {
    ($source_id:expr, $reason:expr) => {
        tracing::warn!(
            source_id = %$source_id,
            reason = %$reason,
            "Record skipped"
        );
    };
}

/// Log loop progress at a fixed cadence
///
/// # Example
///
/// ```no_run
/// use papers3_zotero::log_progress;
///
/// log_progress!(100, 1000);
/// ```
#[macro_export]
macro_rules! log_progress {
    ($current:expr, $total:expr) => {
        tracing::info!(
            current = $current,
            total = $total,
            progress_pct = ($current as f64 / ($total as f64).max(1.0) * 100.0),
            "Import progress"
        );
    };
}
