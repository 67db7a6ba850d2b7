//! Configuration schema types
//!
//! This module defines the run parameters of a migration as they appear in
//! `papers3-zotero.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main migration configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Where the exported Papers3 documents and PDFs live
    #[serde(default)]
    pub source: SourceConfig,

    /// Destination Zotero database
    pub store: StoreConfig,

    /// Import run parameters
    #[serde(default)]
    pub import: ImportConfig,

    /// Attachment file organization
    #[serde(default)]
    pub files: FilesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MigrationConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any value is invalid or two run parameters conflict
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.store.validate()?;
        self.import.validate()?;
        self.files.validate()?;
        self.logging.validate()?;

        if self.import.skip_attachments && self.files.organize {
            return Err(
                "import.skip_attachments cannot be combined with files.organize".to_string(),
            );
        }
        if self.import.skip_attachments && self.import.files_only {
            return Err(
                "import.skip_attachments cannot be combined with import.files_only".to_string(),
            );
        }
        if self.import.files_only && self.files.target_root.is_none() {
            return Err("import.files_only requires files.target_root".to_string());
        }
        Ok(())
    }

    /// Target root for organized attachments, if organizing is active
    pub fn organize_root(&self) -> Option<&Path> {
        if self.files.organize || self.import.files_only {
            self.files.target_root.as_deref()
        } else {
            None
        }
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Source export locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding the exported JSON document set
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,

    /// Root of the Papers3 file store; relative attachment paths resolve here
    #[serde(default)]
    pub attachments_root: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
            attachments_root: None,
        }
    }
}

/// Destination store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to `zotero.sqlite`
    pub path: PathBuf,

    /// Library that receives imported records
    #[serde(default = "default_library_id")]
    pub library_id: i64,

    /// How long a statement waits on a locked database
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

impl StoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("store.path cannot be empty".to_string());
        }
        if self.library_id < 1 {
            return Err(format!(
                "store.library_id must be >= 1, got {}",
                self.library_id
            ));
        }
        if self.busy_timeout_secs == 0 {
            return Err("store.busy_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}

/// Import run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Process everything, then roll back
    #[serde(default)]
    pub dry_run: bool,

    /// Import at most this many publications
    #[serde(default)]
    pub limit: Option<usize>,

    /// Do not create attachment records
    #[serde(default)]
    pub skip_attachments: bool,

    /// Organize files without touching the destination store
    #[serde(default)]
    pub files_only: bool,

    /// Number of error log entries shown in the final report
    #[serde(default = "default_error_display_limit")]
    pub error_display_limit: usize,
}

impl ImportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.limit == Some(0) {
            return Err("import.limit must be > 0 when set".to_string());
        }
        Ok(())
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            limit: None,
            skip_attachments: false,
            files_only: false,
            error_display_limit: default_error_display_limit(),
        }
    }
}

/// Attachment file organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Copy attachments into a year/author/title tree
    #[serde(default)]
    pub organize: bool,

    /// Root of the organized tree
    #[serde(default)]
    pub target_root: Option<PathBuf>,

    /// Highest `_N` suffix tried before falling back to an identifier-keyed name
    #[serde(default = "default_max_numbered_variant")]
    pub max_numbered_variant: u32,

    /// Sidecar file listing every missing source file
    #[serde(default = "default_missing_log")]
    pub missing_log: PathBuf,
}

impl FilesConfig {
    fn validate(&self) -> Result<(), String> {
        if self.organize && self.target_root.is_none() {
            return Err("files.organize requires files.target_root".to_string());
        }
        if self.max_numbered_variant < 2 {
            return Err(format!(
                "files.max_numbered_variant must be >= 2, got {}",
                self.max_numbered_variant
            ));
        }
        Ok(())
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            organize: false,
            target_root: None,
            max_numbered_variant: default_max_numbered_variant(),
            missing_log: default_missing_log(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a local directory
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Directory for local log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation policy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from("catalog")
}

fn default_library_id() -> i64 {
    1
}

fn default_busy_timeout_secs() -> u64 {
    30
}

fn default_error_display_limit() -> usize {
    10
}

fn default_max_numbered_variant() -> u32 {
    10
}

fn default_missing_log() -> PathBuf {
    PathBuf::from("missing_files.log")
}

fn default_true() -> bool {
    true
}

fn default_local_path() -> String {
    "/var/log/papers3-zotero".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
