//! Collection tree import
//!
//! Walks the collection forest in pre-order and materializes each node as a
//! Zotero collection. A node whose name and resolved parent already exist in
//! the store is reused, so importing the same tree twice creates nothing the
//! second time.

use crate::adapters::zotero::{savepoint, transaction_failed};
use crate::core::import::summary::{ImportError, ImportErrorKind};
use crate::core::keys::KeyGenerator;
use crate::domain::{ContainerNode, MigrationError, Result};
use sqlx::SqliteConnection;
use std::collections::HashMap;

/// Result of importing the collection forest
#[derive(Debug, Default)]
pub struct HierarchyImport {
    /// Source collection identifier to store `collectionID`
    pub id_map: HashMap<String, i64>,
    pub created: usize,
    pub reused: usize,
    /// One entry per node that failed; its descendants were skipped
    pub failures: Vec<ImportError>,
    /// Descendants of failed nodes that were never visited
    pub skipped: usize,
}

/// Imports every tree in `roots`.
///
/// Each node is written inside its own savepoint. A node that fails is
/// rolled back and reported, its subtree is skipped, and its siblings are
/// still imported.
///
/// # Errors
///
/// Returns [`MigrationError::CyclicHierarchy`] if a node's identifier appears
/// among its own ancestors, and a store error if savepoint control fails.
/// Either one must abort the run.
pub async fn import_tree(
    conn: &mut SqliteConnection,
    roots: &[ContainerNode],
    library_id: i64,
    keys: &mut KeyGenerator,
) -> Result<HierarchyImport> {
    let mut result = HierarchyImport::default();

    // (node, depth, parent collectionID); roots pushed in reverse to pop in order
    let mut stack: Vec<(&ContainerNode, usize, Option<i64>)> =
        roots.iter().rev().map(|node| (node, 0, None)).collect();
    let mut ancestors: Vec<&str> = Vec::new();

    while let Some((node, depth, parent)) = stack.pop() {
        ancestors.truncate(depth);
        if ancestors.contains(&node.uuid.as_str()) {
            return Err(MigrationError::CyclicHierarchy(format!(
                "collection {} appears below itself ({})",
                node.uuid,
                ancestors.join(" > ")
            )));
        }

        let mut sp = savepoint(conn).await?;
        match materialize(&mut sp, node, parent, library_id, keys).await {
            Ok((collection_id, created)) => {
                sp.commit().await.map_err(transaction_failed("collection commit"))?;
                if created {
                    result.created += 1;
                } else {
                    result.reused += 1;
                }
                if result
                    .id_map
                    .insert(node.uuid.as_str().to_string(), collection_id)
                    .is_some()
                {
                    tracing::warn!(uuid = %node.uuid, "Collection listed twice; last mapping wins");
                }

                ancestors.push(node.uuid.as_str());
                for child in node.children.iter().rev() {
                    stack.push((child, depth + 1, Some(collection_id)));
                }
            }
            Err(e) if e.is_unrecoverable() => return Err(e),
            Err(e) => {
                sp.rollback()
                    .await
                    .map_err(transaction_failed("collection rollback"))?;
                let skipped = node.subtree_len() - 1;
                tracing::warn!(
                    uuid = %node.uuid,
                    name = %node.name,
                    skipped_descendants = skipped,
                    error = %e,
                    "Collection import failed; subtree skipped"
                );
                result.skipped += skipped;
                result.failures.push(ImportError::new(
                    ImportErrorKind::Collection,
                    node.uuid.as_str(),
                    e.to_string(),
                ));
            }
        }
    }

    tracing::info!(
        created = result.created,
        reused = result.reused,
        failed = result.failures.len(),
        "Collections imported"
    );
    Ok(result)
}

/// Finds or creates one collection; returns its id and whether it is new.
async fn materialize(
    conn: &mut SqliteConnection,
    node: &ContainerNode,
    parent: Option<i64>,
    library_id: i64,
    keys: &mut KeyGenerator,
) -> Result<(i64, bool)> {
    let name = node.name.trim();
    if name.is_empty() {
        return Err(MigrationError::Validation(
            "collection has no name".to_string(),
        ));
    }

    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT collectionID FROM collections \
         WHERE collectionName = ? AND libraryID = ? AND parentCollectionID IS ? \
         LIMIT 1",
    )
    .bind(name)
    .bind(library_id)
    .bind(parent)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        tracing::debug!(uuid = %node.uuid, collection_id = id, "Reusing collection");
        return Ok((id, false));
    }

    let key = keys.generate();
    let id = sqlx::query(
        "INSERT INTO collections \
         (collectionName, parentCollectionID, libraryID, key, version, synced) \
         VALUES (?, ?, ?, ?, 0, 0)",
    )
    .bind(name)
    .bind(parent)
    .bind(library_id)
    .bind(key.as_str())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    tracing::debug!(uuid = %node.uuid, collection_id = id, key = %key, "Collection created");
    Ok((id, true))
}
