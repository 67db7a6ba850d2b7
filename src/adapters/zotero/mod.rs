//! Zotero SQLite store
//!
//! - [`client`] - connection lifecycle and the run-wide transaction
//! - [`schema`] - bootstrap of the schema subset used by the migration
//! - [`vocabulary`] - item type, field and creator role ids

pub mod client;
pub mod schema;
pub mod vocabulary;

pub use client::{count_rows, savepoint, transaction_failed, ZoteroStore};
pub use vocabulary::Vocabulary;
