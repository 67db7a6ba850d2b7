//! In-place repair of malformed object keys
//!
//! Finds item and collection keys that do not match the key format and
//! replaces them with freshly generated ones. Every existing key is loaded
//! into the generator first, so a replacement never collides. A rewritten
//! row gets its version bumped and its synced flag cleared so the Zotero
//! client uploads it again.

use crate::adapters::zotero::{transaction_failed, ZoteroStore};
use crate::core::keys::KeyGenerator;
use crate::domain::Result;
use serde::Serialize;
use sqlx::SqliteConnection;

/// Tables carrying object keys, with their primary key column
const KEYED_TABLES: [(&str, &str); 2] = [("collections", "collectionID"), ("items", "itemID")];

/// Per-table repair counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRepair {
    pub table: &'static str,
    pub invalid_found: usize,
    pub fixed: usize,
}

/// Result of a repair run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub dry_run: bool,
    pub tables: Vec<TableRepair>,
    /// Invalid keys left after the repair
    pub remaining_invalid: usize,
    /// Keys used by more than one row of the same table
    pub duplicate_keys: Vec<String>,
}

impl RepairReport {
    pub fn invalid_found(&self) -> usize {
        self.tables.iter().map(|t| t.invalid_found).sum()
    }

    pub fn fixed(&self) -> usize {
        self.tables.iter().map(|t| t.fixed).sum()
    }

    /// True when the store ends up with only valid, unique keys
    pub fn is_clean(&self) -> bool {
        self.remaining_invalid == 0 && self.duplicate_keys.is_empty()
    }
}

struct KeyedRow {
    id: i64,
    key: String,
}

/// Repairs every malformed key in the store.
///
/// With `dry_run` nothing is written and the report only counts what would
/// be replaced.
pub async fn repair_keys(store: &mut ZoteroStore, dry_run: bool) -> Result<RepairReport> {
    let mut keys = KeyGenerator::new();
    keys.seed_from_store(store.connection()).await?;

    let mut pending = Vec::new();
    for (table, id_column) in KEYED_TABLES {
        let invalid = invalid_rows(store.connection(), table, id_column).await?;
        if invalid.is_empty() {
            tracing::info!(table, "All keys are valid");
        } else {
            tracing::warn!(table, invalid = invalid.len(), "Found invalid keys");
        }
        pending.push((table, id_column, invalid));
    }

    let mut tables = Vec::new();
    if dry_run {
        for (table, _, invalid) in &pending {
            for row in invalid {
                tracing::info!(table = *table, id = row.id, key = %row.key, "Would replace key");
            }
            tables.push(TableRepair {
                table: *table,
                invalid_found: invalid.len(),
                fixed: 0,
            });
        }
    } else {
        let mut tx = store.begin().await?;
        for (table, id_column, invalid) in &pending {
            let sql = format!(
                "UPDATE {table} SET key = ?, version = version + 1, synced = 0 WHERE {id_column} = ?"
            );
            for row in invalid {
                let replacement = keys.generate();
                sqlx::query(&sql)
                    .bind(replacement.as_str())
                    .bind(row.id)
                    .execute(&mut *tx)
                    .await?;
                tracing::debug!(
                    table = *table,
                    id = row.id,
                    old_key = %row.key,
                    new_key = %replacement,
                    "Key replaced"
                );
            }
            tables.push(TableRepair {
                table: *table,
                invalid_found: invalid.len(),
                fixed: invalid.len(),
            });
        }
        tx.commit().await.map_err(transaction_failed("commit"))?;
    }

    let mut remaining_invalid = 0;
    let mut duplicate_keys = Vec::new();
    for (table, id_column) in KEYED_TABLES {
        remaining_invalid += invalid_rows(store.connection(), table, id_column)
            .await?
            .len();
        duplicate_keys.extend(duplicates(store.connection(), table).await?);
    }

    let report = RepairReport {
        dry_run,
        tables,
        remaining_invalid,
        duplicate_keys,
    };
    tracing::info!(
        dry_run,
        invalid_found = report.invalid_found(),
        fixed = report.fixed(),
        remaining_invalid = report.remaining_invalid,
        duplicates = report.duplicate_keys.len(),
        "Key repair finished"
    );
    Ok(report)
}

async fn invalid_rows(
    conn: &mut SqliteConnection,
    table: &str,
    id_column: &str,
) -> Result<Vec<KeyedRow>> {
    let rows: Vec<(i64, String)> = sqlx::query_as(&format!(
        "SELECT {id_column}, key FROM {table} WHERE key IS NOT NULL"
    ))
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows
        .into_iter()
        .filter(|(_, key)| !KeyGenerator::is_valid(key))
        .map(|(id, key)| KeyedRow { id, key })
        .collect())
}

async fn duplicates(conn: &mut SqliteConnection, table: &str) -> Result<Vec<String>> {
    let keys: Vec<String> = sqlx::query_scalar(&format!(
        "SELECT key FROM {table} WHERE key IS NOT NULL GROUP BY key HAVING COUNT(*) > 1"
    ))
    .fetch_all(&mut *conn)
    .await?;
    for key in &keys {
        tracing::error!(table, key = %key, "Duplicate key");
    }
    Ok(keys)
}
