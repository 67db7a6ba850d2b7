//! Papers3 export loader
//!
//! Reads the JSON document set written by the export scripts:
//!
//! - `papers3_publications_full.json` (or `papers3_publications.json`) with a
//!   top-level `{"publications": [...]}`. Mandatory.
//! - `papers3_collections.json` with `{"collections": [...]}`. Optional.
//!
//! Publications are decoded one by one, so a single malformed entry becomes
//! a [`DocumentEntry::Malformed`] value for the import loop to report rather
//! than failing the whole load.

use crate::domain::context::ResultExt;
use crate::domain::{assemble_forest, ContainerNode, MigrationError, Result, SourceDocument};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Preferred publications file, with extended metadata
pub const FULL_PUBLICATIONS_FILE: &str = "papers3_publications_full.json";
/// Fallback publications file
pub const PUBLICATIONS_FILE: &str = "papers3_publications.json";
/// Collection tree file
pub const COLLECTIONS_FILE: &str = "papers3_collections.json";

/// One element of the publications array
#[derive(Debug, Clone)]
pub enum DocumentEntry {
    Valid(Box<SourceDocument>),
    Malformed {
        /// Position in the publications array
        index: usize,
        /// The entry's `uuid`, when it has a readable one
        identifier: Option<String>,
        reason: String,
    },
}

impl DocumentEntry {
    fn decode(index: usize, value: Value) -> Self {
        let identifier = value
            .get("uuid")
            .and_then(Value::as_str)
            .map(str::to_string);
        match serde_json::from_value::<SourceDocument>(value) {
            Ok(doc) => DocumentEntry::Valid(Box::new(doc)),
            Err(e) => DocumentEntry::Malformed {
                index,
                identifier,
                reason: e.to_string(),
            },
        }
    }

    /// Identifier used in logs and the error report
    pub fn label(&self) -> String {
        match self {
            DocumentEntry::Valid(doc) => doc.uuid.to_string(),
            DocumentEntry::Malformed {
                index,
                identifier: Some(id),
                ..
            } if !id.trim().is_empty() => format!("{id} (entry {index})"),
            DocumentEntry::Malformed { index, .. } => format!("entry {index}"),
        }
    }
}

/// Everything the import reads from the export
#[derive(Debug, Clone)]
pub struct DocumentSet {
    pub publications: Vec<DocumentEntry>,
    /// Assembled collection forest; empty when the export has none
    pub collections: Vec<ContainerNode>,
    /// Publications file actually read
    pub source_file: PathBuf,
}

impl DocumentSet {
    /// Keeps only the first `limit` publications.
    pub fn truncate(&mut self, limit: Option<usize>) {
        if let Some(limit) = limit {
            self.publications.truncate(limit);
        }
    }

    /// Total number of collection nodes across the forest
    pub fn collection_count(&self) -> usize {
        self.collections.iter().map(ContainerNode::subtree_len).sum()
    }
}

#[derive(Deserialize)]
struct PublicationsFile {
    publications: Vec<Value>,
}

#[derive(Deserialize)]
struct CollectionsFile {
    #[serde(default)]
    collections: Vec<ContainerNode>,
}

/// Locates the publications file, preferring the full export.
pub fn publications_path(catalog_dir: &Path) -> Result<PathBuf> {
    [FULL_PUBLICATIONS_FILE, PUBLICATIONS_FILE]
        .iter()
        .map(|name| catalog_dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            MigrationError::InputNotFound(format!(
                "no {FULL_PUBLICATIONS_FILE} or {PUBLICATIONS_FILE} in {}",
                catalog_dir.display()
            ))
        })
}

/// Loads the document set from `catalog_dir`.
///
/// # Errors
///
/// - [`MigrationError::InputNotFound`] when no publications file exists or
///   it is not a publications document
/// - [`MigrationError::CyclicHierarchy`] when the collection tree is not a tree
/// - [`MigrationError::Serialization`] when the collections file is unreadable
pub fn load_document_set(catalog_dir: &Path) -> Result<DocumentSet> {
    let source_file = publications_path(catalog_dir)?;
    let text = std::fs::read_to_string(&source_file)
        .with_context(|| format!("Failed to read {}", source_file.display()))?;
    let parsed: PublicationsFile = serde_json::from_str(&text).map_err(|e| {
        MigrationError::InputNotFound(format!(
            "{} is not a publications document: {e}",
            source_file.display()
        ))
    })?;

    let publications: Vec<DocumentEntry> = parsed
        .publications
        .into_iter()
        .enumerate()
        .map(|(i, value)| DocumentEntry::decode(i, value))
        .collect();

    let collections = load_collections(&catalog_dir.join(COLLECTIONS_FILE))?;

    let malformed = publications
        .iter()
        .filter(|entry| matches!(entry, DocumentEntry::Malformed { .. }))
        .count();
    tracing::info!(
        file = %source_file.display(),
        publications = publications.len(),
        malformed,
        collection_roots = collections.len(),
        "Loaded Papers3 document set"
    );

    Ok(DocumentSet {
        publications,
        collections,
        source_file,
    })
}

fn load_collections(path: &Path) -> Result<Vec<ContainerNode>> {
    if !path.is_file() {
        tracing::info!(file = %path.display(), "No collections file; skipping collections");
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed: CollectionsFile = serde_json::from_str(&text).map_err(|e| {
        MigrationError::Serialization(format!("{}: {e}", path.display()))
    })?;
    assemble_forest(parsed.collections)
}
