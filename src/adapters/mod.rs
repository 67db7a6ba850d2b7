//! External system integrations.
//!
//! - [`papers3`] - the JSON document set exported from a Papers3 library
//! - [`zotero`] - the destination Zotero SQLite database
//!
//! Adapters isolate file formats and SQL from the import logic in
//! [`crate::core`].
//!
//! ```rust,no_run
//! use papers3_zotero::adapters::papers3::load_document_set;
//! use papers3_zotero::adapters::zotero::ZoteroStore;
//! use papers3_zotero::config::StoreConfig;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let documents = load_document_set(Path::new("catalog"))?;
//! let store = ZoteroStore::open(&StoreConfig {
//!     path: "zotero.sqlite".into(),
//!     library_id: 1,
//!     busy_timeout_secs: 30,
//! })
//! .await?;
//! println!("{} publications", documents.publications.len());
//! store.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod papers3;
pub mod zotero;
