//! Error context extension trait
//!
//! `anyhow::Context` for library code that must keep returning
//! [`MigrationError`]: the underlying error is converted first, then
//! prefixed with the context. Setup classifications survive the wrap, so a
//! missing store stays a missing store.
//!
//! # Examples
//!
//! ```rust
//! use papers3_zotero::domain::Result;
//! use papers3_zotero::domain::context::ResultExt;
//!
//! fn read_catalog(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
//! }
//! ```

use crate::domain::errors::MigrationError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    /// Add context to an error, computing it only on failure
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<MigrationError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.map_err(|e| wrap(e.into(), &context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), &f()))
    }
}

fn wrap(error: MigrationError, context: &dyn std::fmt::Display) -> MigrationError {
    match error {
        MigrationError::Configuration(msg) => {
            MigrationError::Configuration(format!("{context}: {msg}"))
        }
        MigrationError::InputNotFound(msg) => {
            MigrationError::InputNotFound(format!("{context}: {msg}"))
        }
        MigrationError::StoreNotFound(msg) => {
            MigrationError::StoreNotFound(format!("{context}: {msg}"))
        }
        MigrationError::CyclicHierarchy(msg) => {
            MigrationError::CyclicHierarchy(format!("{context}: {msg}"))
        }
        other => MigrationError::Other(format!("{context}: {other}")),
    }
}
