//! Type, field and creator-role vocabularies
//!
//! Zotero identifies item types, fields and creator roles by integer ids
//! that differ between schema versions. They are read from the store once
//! per run and looked up by name.

use crate::domain::{Result, StoreError};
use sqlx::SqliteConnection;
use std::collections::HashMap;

/// Role used when a creator's role is not in the store's vocabulary
pub const FALLBACK_CREATOR_TYPE: &str = "author";

/// Name-to-id maps loaded from the destination store
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    item_types: HashMap<String, i64>,
    fields: HashMap<String, i64>,
    creator_types: HashMap<String, i64>,
}

impl Vocabulary {
    /// Reads all three vocabularies.
    pub async fn load(conn: &mut SqliteConnection) -> Result<Self> {
        let item_types = load_pairs(conn, "SELECT typeName, itemTypeID FROM itemTypes").await?;
        let fields = load_pairs(conn, "SELECT fieldName, fieldID FROM fields").await?;
        let creator_types =
            load_pairs(conn, "SELECT creatorType, creatorTypeID FROM creatorTypes").await?;

        tracing::debug!(
            item_types = item_types.len(),
            fields = fields.len(),
            creator_types = creator_types.len(),
            "Vocabulary loaded"
        );

        Ok(Self {
            item_types,
            fields,
            creator_types,
        })
    }

    pub fn item_type_id(&self, name: &str) -> Result<i64> {
        self.item_types
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::VocabularyMissing(format!("item type '{name}'")).into())
    }

    pub fn field_id(&self, name: &str) -> Result<i64> {
        self.fields
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::VocabularyMissing(format!("field '{name}'")).into())
    }

    /// Id of `role`, or of [`FALLBACK_CREATOR_TYPE`] when the role is unknown.
    pub fn creator_type_id(&self, role: &str) -> Result<i64> {
        self.creator_types
            .get(role)
            .or_else(|| self.creator_types.get(FALLBACK_CREATOR_TYPE))
            .copied()
            .ok_or_else(|| {
                StoreError::VocabularyMissing(format!("creator type '{FALLBACK_CREATOR_TYPE}'"))
                    .into()
            })
    }
}

async fn load_pairs(conn: &mut SqliteConnection, sql: &str) -> Result<HashMap<String, i64>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(sql).fetch_all(&mut *conn).await?;
    Ok(rows.into_iter().collect())
}
