//! Domain models and types.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`SourceId`], [`ItemKey`]) and the key grammar
//! - **Source models** ([`SourceDocument`], [`Author`], [`ContainerNode`])
//! - **Date conversion rules** ([`dates`])
//! - **Error types** ([`MigrationError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Source identifiers and destination keys are distinct newtypes, and an
//! [`ItemKey`] can only be constructed from a well-formed token:
//!
//! ```rust
//! use papers3_zotero::domain::{ItemKey, SourceId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = SourceId::new("6A1E4C1F-0B5D-4F0B-9F38-6C1D0E3B2A11")?;
//! let key = ItemKey::new("X7K9M2PQ")?;
//! assert!(ItemKey::new(source.as_str()).is_err());
//! # let _ = key;
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod context;
pub mod dates;
pub mod errors;
pub mod ids;
pub mod publication;
pub mod result;

// Re-export commonly used types for convenience
pub use collection::{assemble_forest, ContainerNode};
pub use errors::{MigrationError, StoreError};
pub use ids::{is_valid_key, ItemKey, SourceId, KEY_ALPHABET, KEY_LENGTH};
pub use publication::{AttachmentRef, Author, CollectionRef, Keyword, SourceDocument};
pub use result::Result;
