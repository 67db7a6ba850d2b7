//! Configuration management.
//!
//! Run parameters come from a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `P3Z_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of conflicting parameters
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use papers3_zotero::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("papers3-zotero.toml")?;
//!
//! println!("Store: {}", config.store.path.display());
//! println!("Dry run: {}", config.import.dry_run);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`SourceConfig`] - Exported catalog and attachment locations
//! - [`StoreConfig`] - Destination database and library
//! - [`ImportConfig`] - Dry run, record cap, attachment switches
//! - [`FilesConfig`] - Organized attachment tree
//! - [`LoggingConfig`] - Local log files
//!
//! # Example Configuration
//!
//! ```toml
//! [source]
//! catalog_dir = "catalog"
//! attachments_root = "${HOME}/Documents/Papers3/Library.papers3/Files"
//!
//! [store]
//! path = "${HOME}/Zotero/zotero.sqlite"
//!
//! [import]
//! dry_run = true
//! limit = 50
//!
//! [files]
//! organize = true
//! target_root = "${HOME}/Papers"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, FilesConfig, ImportConfig, LoggingConfig, MigrationConfig, SourceConfig,
    StoreConfig,
};
