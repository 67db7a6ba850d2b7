//! Run-scoped value interning
//!
//! Creators, tags and field values are shared rows in the Zotero schema.
//! [`ValueInterner`] resolves each natural key to exactly one row id per
//! run: cache first, then the store, then an insert. Every cache entry
//! added while a record is being imported is journaled so that, if the
//! record's savepoint is rolled back, the cache forgets it too. Otherwise a
//! later record could be linked to an id SQLite has since reused. This
//! includes entries found in the store, since the row found may itself have
//! been inserted by the same record under another cache key.

use crate::domain::Result;
use serde::Serialize;
use sqlx::SqliteConnection;
use std::collections::HashMap;

/// Creation counters for the final report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InternStats {
    pub creators_created: usize,
    pub tags_created: usize,
    pub values_created: usize,
}

#[derive(Debug)]
enum CacheKey {
    Creator((String, String)),
    Tag(String),
    Value((i64, String)),
}

/// A cache entry added during the open record
#[derive(Debug)]
struct Journaled {
    key: CacheKey,
    /// The row was inserted, not found
    created: bool,
}

/// Natural-key resolver for creators, tags and field values
#[derive(Debug, Default)]
pub struct ValueInterner {
    creators: HashMap<(String, String), i64>,
    tags: HashMap<String, i64>,
    values: HashMap<(i64, String), i64>,
    journal: Vec<Journaled>,
    stats: InternStats,
}

impl ValueInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> InternStats {
        self.stats
    }

    /// Resolves a creator by `(first, last)`; `None` when both are blank.
    pub async fn resolve_creator(
        &mut self,
        conn: &mut SqliteConnection,
        first: &str,
        last: &str,
    ) -> Result<Option<i64>> {
        if first.trim().is_empty() && last.trim().is_empty() {
            return Ok(None);
        }
        let key = (first.to_string(), last.to_string());
        if let Some(&id) = self.creators.get(&key) {
            return Ok(Some(id));
        }

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT creatorID FROM creators WHERE firstName = ? AND lastName = ? LIMIT 1",
        )
        .bind(first)
        .bind(last)
        .fetch_optional(&mut *conn)
        .await?;

        let (id, created) = match existing {
            Some(id) => (id, false),
            None => {
                let id = sqlx::query(
                    "INSERT INTO creators (firstName, lastName, fieldMode) VALUES (?, ?, 0)",
                )
                .bind(first)
                .bind(last)
                .execute(&mut *conn)
                .await?
                .last_insert_rowid();
                self.stats.creators_created += 1;
                tracing::trace!(creator_id = id, first, last, "Creator created");
                (id, true)
            }
        };
        self.journal.push(Journaled {
            key: CacheKey::Creator(key.clone()),
            created,
        });
        self.creators.insert(key, id);
        Ok(Some(id))
    }

    /// Resolves a tag by name; `None` for a blank name.
    pub async fn resolve_tag(
        &mut self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Option<i64>> {
        if name.trim().is_empty() {
            return Ok(None);
        }
        if let Some(&id) = self.tags.get(name) {
            return Ok(Some(id));
        }

        let existing: Option<i64> = sqlx::query_scalar("SELECT tagID FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        let (id, created) = match existing {
            Some(id) => (id, false),
            None => {
                let id = sqlx::query("INSERT INTO tags (name) VALUES (?)")
                    .bind(name)
                    .execute(&mut *conn)
                    .await?
                    .last_insert_rowid();
                self.stats.tags_created += 1;
                (id, true)
            }
        };
        self.journal.push(Journaled {
            key: CacheKey::Tag(name.to_string()),
            created,
        });
        self.tags.insert(name.to_string(), id);
        Ok(Some(id))
    }

    /// Resolves the `itemDataValues` row for a field literal; `None` when blank.
    ///
    /// Zotero stores each distinct literal once regardless of field, so the
    /// store lookup is by value while the cache is keyed per field.
    pub async fn resolve_field_value(
        &mut self,
        conn: &mut SqliteConnection,
        field_id: i64,
        literal: &str,
    ) -> Result<Option<i64>> {
        if literal.trim().is_empty() {
            return Ok(None);
        }
        let key = (field_id, literal.to_string());
        if let Some(&id) = self.values.get(&key) {
            return Ok(Some(id));
        }

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT valueID FROM itemDataValues WHERE value = ?")
                .bind(literal)
                .fetch_optional(&mut *conn)
                .await?;

        let (id, created) = match existing {
            Some(id) => (id, false),
            None => {
                let id = sqlx::query("INSERT INTO itemDataValues (value) VALUES (?)")
                    .bind(literal)
                    .execute(&mut *conn)
                    .await?
                    .last_insert_rowid();
                self.stats.values_created += 1;
                (id, true)
            }
        };
        self.journal.push(Journaled {
            key: CacheKey::Value(key.clone()),
            created,
        });
        self.values.insert(key, id);
        Ok(Some(id))
    }

    /// Marks everything created so far as durable within the run.
    pub fn commit_record(&mut self) {
        self.journal.clear();
    }

    /// Forgets cache entries added since the last commit; their savepoint was rolled back.
    pub fn discard_record(&mut self) {
        for Journaled { key, created } in self.journal.drain(..) {
            match key {
                CacheKey::Creator(key) => {
                    self.creators.remove(&key);
                    if created {
                        self.stats.creators_created -= 1;
                    }
                }
                CacheKey::Tag(name) => {
                    self.tags.remove(&name);
                    if created {
                        self.stats.tags_created -= 1;
                    }
                }
                CacheKey::Value(key) => {
                    self.values.remove(&key);
                    if created {
                        self.stats.values_created -= 1;
                    }
                }
            }
        }
    }
}
