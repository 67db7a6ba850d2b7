// Papers3-Zotero - Papers3 library migration into Zotero
// Copyright (c) 2025 Papers3-Zotero Contributors
// Licensed under the MIT License

//! # Papers3-Zotero
//!
//! Moves a Papers3 reference library, exported as JSON, into a Zotero
//! SQLite store in one transaction.
//!
//! ## Overview
//!
//! This library provides:
//! - **Loading** the exported publications and collection tree
//! - **Importing** collections, publications, creators, tags and attachments
//!   with per-record isolation, so a bad document is skipped and logged
//! - **Organizing** attachment files into a year/author/title tree with
//!   content-based duplicate detection
//! - **Repairing** malformed object keys in an existing store
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Import, key generation, interning, file organization, repair
//! - [`adapters`] - Papers3 export reader and Zotero store access
//! - [`domain`] - Source document types, identifiers and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use papers3_zotero::config::load_config;
//! use papers3_zotero::core::import::ImportCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = load_config("papers3-zotero.toml")?;
//!     config.import.dry_run = true;
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let summary = ImportCoordinator::new(config, shutdown_rx).execute().await?;
//!
//!     println!("Would import {} publications", summary.records_imported);
//!     Ok(())
//! }
//! ```
//!
//! ## Transactions
//!
//! The collection tree and every publication are written inside a single
//! transaction. Each publication and each collection node gets its own
//! savepoint: a failure rolls back that savepoint only, and the run goes on.
//! A dry run, an interruption, or an unrecoverable store error rolls back
//! the whole transaction.
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`], whose error type is
//! [`domain::MigrationError`]. Per-record failures are not errors; they are
//! collected in the [`core::import::ImportSummary`].
//!
//! ## Logging
//!
//! Logging goes through `tracing`:
//!
//! ```rust,no_run
//! tracing::info!(documents = 120, "Starting import");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
