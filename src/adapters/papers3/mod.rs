//! Papers3 export (read-only input)

pub mod loader;

pub use loader::{load_document_set, DocumentEntry, DocumentSet};
