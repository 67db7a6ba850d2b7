//! Domain error types
//!
//! This module defines the error hierarchy for the migration. Errors are
//! grouped by where they can occur so callers can tell setup failures apart
//! from failures that happen once the import transaction is open.

use thiserror::Error;

/// Main migration error type
///
/// This is the primary error type used throughout the library. Per-record and
/// per-file problems are not represented here; those are reported as values
/// in the import summary and never abort a run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Configuration-related errors, including conflicting run parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The mandatory input document set is absent
    #[error("Input not found: {0}")]
    InputNotFound(String),

    /// The destination store does not exist
    #[error("Destination store not found: {0}")]
    StoreNotFound(String),

    /// Destination store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The collection tree contains a cycle or a repeated identifier
    #[error("Cyclic collection hierarchy: {0}")]
    CyclicHierarchy(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl MigrationError {
    /// Returns true for failures that happen before any transaction begins.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(
            self,
            MigrationError::Configuration(_)
                | MigrationError::InputNotFound(_)
                | MigrationError::StoreNotFound(_)
        )
    }

    /// Returns true for mid-run failures that must roll back the whole run
    /// instead of skipping one record or collection.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            MigrationError::Store(StoreError::TransactionFailed(_))
                | MigrationError::Store(StoreError::ConnectionFailed(_))
                | MigrationError::CyclicHierarchy(_)
        )
    }
}

/// Destination store errors
///
/// These errors don't expose the driver's types to callers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to open the store
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// A statement failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A uniqueness or foreign-key constraint rejected a write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Beginning, committing or rolling back a transaction failed
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A required vocabulary entry (item type, field, creator role) is missing
    #[error("Vocabulary entry missing: {0}")]
    VocabularyMissing(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        MigrationError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for MigrationError {
    fn from(err: serde_json::Error) -> Self {
        MigrationError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for MigrationError {
    fn from(err: toml::de::Error) -> Self {
        MigrationError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<sqlx::Error> for MigrationError {
    fn from(err: sqlx::Error) -> Self {
        let store_error = match &err {
            sqlx::Error::Database(db)
                if db.is_unique_violation() || db.is_foreign_key_violation() =>
            {
                StoreError::ConstraintViolation(db.message().to_string())
            }
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::ConnectionFailed(err.to_string())
            }
            _ => StoreError::QueryFailed(err.to_string()),
        };
        MigrationError::Store(store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_error_display() {
        let err = MigrationError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_store_error_conversion() {
        let store_err = StoreError::VocabularyMissing("itemType 'document'".to_string());
        let err: MigrationError = store_err.into();
        assert!(matches!(err, MigrationError::Store(_)));
        assert!(err.to_string().contains("itemType 'document'"));
    }

    #[test]
    fn test_fatal_setup_classification() {
        assert!(MigrationError::InputNotFound("catalog".into()).is_fatal_setup());
        assert!(MigrationError::StoreNotFound("zotero.sqlite".into()).is_fatal_setup());
        assert!(MigrationError::Configuration("conflict".into()).is_fatal_setup());
        assert!(!MigrationError::Io("disk full".into()).is_fatal_setup());
        assert!(!MigrationError::CyclicHierarchy("a -> b -> a".into()).is_fatal_setup());
    }

    #[test]
    fn test_unrecoverable_classification() {
        let tx: MigrationError = StoreError::TransactionFailed("commit".into()).into();
        assert!(tx.is_unrecoverable());
        let query: MigrationError = StoreError::QueryFailed("no such column".into()).into();
        assert!(!query.is_unrecoverable());
        assert!(MigrationError::CyclicHierarchy("A".into()).is_unrecoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: MigrationError = io_err.into();
        assert!(matches!(err, MigrationError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: MigrationError = json_err.into();
        assert!(matches!(err, MigrationError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: MigrationError = toml_err.into();
        assert!(matches!(err, MigrationError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_query_failed() {
        let err: MigrationError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, MigrationError::Store(StoreError::QueryFailed(_))));
    }
}
