//! Core business logic for the migration.
//!
//! # Modules
//!
//! - [`keys`] - Zotero object key generation
//! - [`intern`] - Deduplication of creators, tags and field values
//! - [`collections`] - Collection tree import
//! - [`files`] - Attachment file organization with duplicate detection
//! - [`import`] - Transactional import orchestration and reporting
//! - [`repair`] - In-place repair of malformed keys
//!
//! # Import Workflow
//!
//! 1. **Load**: Read the Papers3 publications and collection tree
//! 2. **Collections**: Materialize the tree, reusing existing collections
//! 3. **Publications**: Import each one in its own savepoint, interning
//!    creators, tags and field values and placing attachment files
//! 4. **Commit or roll back**: One transaction spans the whole run
//! 5. **Report**: Counts and a bounded error log
//!
//! # Example
//!
//! ```rust,no_run
//! use papers3_zotero::config::load_config;
//! use papers3_zotero::core::import::ImportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("papers3-zotero.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = ImportCoordinator::new(config, shutdown_rx);
//! let summary = coordinator.execute().await?;
//!
//! println!("Imported: {}", summary.records_imported);
//! println!("Failed: {}", summary.records_failed);
//! # Ok(())
//! # }
//! ```

pub mod collections;
pub mod files;
pub mod import;
pub mod intern;
pub mod keys;
pub mod repair;
