//! Single-publication import
//!
//! [`RecordImporter`] owns everything scoped to one run except the store
//! connection: the key generator, the value interner, the file organizer,
//! the collection id map and the set of source identifiers already imported.
//! Each publication is written inside its own savepoint, so a failure leaves
//! no trace of that publication in the store.

use super::mapping::{
    content_type, field_values, item_type_name, ATTACHMENT_ITEM_TYPE, FALLBACK_ITEM_TYPE,
    FLAGGED_TAG,
};
use super::summary::{ImportError, ImportErrorKind};
use crate::adapters::zotero::{savepoint, transaction_failed, Vocabulary};
use crate::core::files::{FileMeta, FileOrganizer, FileOutcome};
use crate::core::intern::{InternStats, ValueInterner};
use crate::core::keys::KeyGenerator;
use crate::domain::dates::store_timestamp;
use crate::domain::{AttachmentRef, Result, SourceDocument};
use sqlx::SqliteConnection;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Zotero link mode for a linked file
const LINK_MODE_LINKED_FILE: i64 = 2;

/// Outcome of importing one publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Imported {
        item_id: i64,
        attachments: usize,
        /// Attachments left out because their file was missing or unusable
        file_errors: Vec<ImportError>,
    },
    /// Nothing of this publication was written
    Failed { source_id: String, reason: String },
}

struct Written {
    item_id: i64,
    attachments: usize,
    file_errors: Vec<ImportError>,
}

/// Run-scoped publication importer
pub struct RecordImporter {
    library_id: i64,
    vocabulary: Vocabulary,
    collections: HashMap<String, i64>,
    skip_attachments: bool,
    keys: KeyGenerator,
    interner: ValueInterner,
    organizer: FileOrganizer,
    imported: HashSet<String>,
}

impl RecordImporter {
    pub fn new(
        library_id: i64,
        vocabulary: Vocabulary,
        collections: HashMap<String, i64>,
        keys: KeyGenerator,
        organizer: FileOrganizer,
        skip_attachments: bool,
    ) -> Self {
        Self {
            library_id,
            vocabulary,
            collections,
            skip_attachments,
            keys,
            interner: ValueInterner::new(),
            organizer,
            imported: HashSet::new(),
        }
    }

    pub fn intern_stats(&self) -> InternStats {
        self.interner.stats()
    }

    pub fn organizer(&self) -> &FileOrganizer {
        &self.organizer
    }

    pub fn organizer_mut(&mut self) -> &mut FileOrganizer {
        &mut self.organizer
    }

    /// Imports one publication.
    ///
    /// Per-record problems come back as [`RecordOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// Only failures that must abort the whole run, such as a savepoint
    /// that cannot be released.
    pub async fn import(
        &mut self,
        conn: &mut SqliteConnection,
        doc: &SourceDocument,
    ) -> Result<RecordOutcome> {
        let source_id = doc.uuid.as_str().to_string();
        if self.imported.contains(&source_id) {
            return Ok(RecordOutcome::Failed {
                source_id,
                reason: "duplicate source identifier in this run".to_string(),
            });
        }

        let mut sp = savepoint(conn).await?;
        match self.write(&mut sp, doc).await {
            Ok(written) => {
                sp.commit().await.map_err(transaction_failed("record commit"))?;
                self.interner.commit_record();
                self.organizer.commit_record();
                self.imported.insert(source_id);
                Ok(RecordOutcome::Imported {
                    item_id: written.item_id,
                    attachments: written.attachments,
                    file_errors: written.file_errors,
                })
            }
            Err(e) if e.is_unrecoverable() => Err(e),
            Err(e) => {
                sp.rollback()
                    .await
                    .map_err(transaction_failed("record rollback"))?;
                self.interner.discard_record();
                self.organizer.discard_record();
                Ok(RecordOutcome::Failed {
                    source_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn write(&mut self, conn: &mut SqliteConnection, doc: &SourceDocument) -> Result<Written> {
        let type_name = item_type_name(doc.kind.as_deref());
        let item_type_id = self
            .vocabulary
            .item_type_id(type_name)
            .or_else(|_| self.vocabulary.item_type_id(FALLBACK_ITEM_TYPE))?;

        let date_added = store_timestamp(doc.created_at.as_deref());
        let date_modified = doc
            .updated_at
            .as_deref()
            .map(|updated| store_timestamp(Some(updated)))
            .unwrap_or_else(|| date_added.clone());

        let key = self.keys.generate();
        let item_id = sqlx::query(
            "INSERT INTO items \
             (itemTypeID, libraryID, key, dateAdded, dateModified, version, synced) \
             VALUES (?, ?, ?, ?, ?, 0, 0)",
        )
        .bind(item_type_id)
        .bind(self.library_id)
        .bind(key.as_str())
        .bind(&date_added)
        .bind(&date_modified)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        for (field, value) in field_values(doc) {
            self.set_field(conn, item_id, field, &value).await?;
        }
        self.link_creators(conn, item_id, doc).await?;
        self.link_tags(conn, item_id, doc).await?;
        self.link_collections(conn, item_id, doc).await?;

        let mut attachments = 0;
        let mut file_errors = Vec::new();
        if !self.skip_attachments && !doc.attachments.is_empty() {
            let meta = FileMeta::from_document(doc);
            for attachment in &doc.attachments {
                let outcome = self.organizer.resolve(&attachment.path, &meta);
                match outcome.stored_path() {
                    Some(path) => {
                        self.write_attachment(conn, item_id, path, attachment).await?;
                        attachments += 1;
                    }
                    None => file_errors.push(file_error(&meta.source_id, &outcome)),
                }
            }
        }

        tracing::debug!(
            uuid = %doc.uuid,
            item_id,
            key = %key,
            item_type = type_name,
            attachments,
            "Publication imported"
        );
        Ok(Written {
            item_id,
            attachments,
            file_errors,
        })
    }

    async fn set_field(
        &mut self,
        conn: &mut SqliteConnection,
        item_id: i64,
        field: &str,
        value: &str,
    ) -> Result<()> {
        let field_id = self.vocabulary.field_id(field)?;
        let Some(value_id) = self
            .interner
            .resolve_field_value(conn, field_id, value)
            .await?
        else {
            return Ok(());
        };
        sqlx::query("INSERT INTO itemData (itemID, fieldID, valueID) VALUES (?, ?, ?)")
            .bind(item_id)
            .bind(field_id)
            .bind(value_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn link_creators(
        &mut self,
        conn: &mut SqliteConnection,
        item_id: i64,
        doc: &SourceDocument,
    ) -> Result<()> {
        let mut linked = HashSet::new();
        let mut order_index: i64 = 0;
        for author in &doc.authors {
            let (first, last) = author.name_parts();
            let Some(creator_id) = self.interner.resolve_creator(conn, &first, &last).await?
            else {
                continue;
            };
            let creator_type_id = self.vocabulary.creator_type_id(author.role())?;
            if !linked.insert((creator_id, creator_type_id)) {
                continue;
            }
            sqlx::query(
                "INSERT INTO itemCreators (itemID, creatorID, creatorTypeID, orderIndex) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(item_id)
            .bind(creator_id)
            .bind(creator_type_id)
            .bind(order_index)
            .execute(&mut *conn)
            .await?;
            order_index += 1;
        }
        Ok(())
    }

    async fn link_tags(
        &mut self,
        conn: &mut SqliteConnection,
        item_id: i64,
        doc: &SourceDocument,
    ) -> Result<()> {
        let mut names: Vec<&str> = doc.keywords.iter().map(|k| k.0.trim()).collect();
        if doc.flagged {
            names.push(FLAGGED_TAG);
        }

        let mut linked = HashSet::new();
        for name in names {
            let Some(tag_id) = self.interner.resolve_tag(conn, name).await? else {
                continue;
            };
            if !linked.insert(tag_id) {
                continue;
            }
            sqlx::query("INSERT INTO itemTags (itemID, tagID, type) VALUES (?, ?, 0)")
                .bind(item_id)
                .bind(tag_id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    async fn link_collections(
        &mut self,
        conn: &mut SqliteConnection,
        item_id: i64,
        doc: &SourceDocument,
    ) -> Result<()> {
        let mut linked = HashSet::new();
        for reference in &doc.collections {
            let Some(&collection_id) = self.collections.get(reference.0.as_str()) else {
                tracing::debug!(
                    uuid = %doc.uuid,
                    collection = %reference.0,
                    "Publication refers to a collection that was not imported"
                );
                continue;
            };
            if !linked.insert(collection_id) {
                continue;
            }
            sqlx::query(
                "INSERT INTO collectionItems (collectionID, itemID, orderIndex) VALUES (?, ?, 0)",
            )
            .bind(collection_id)
            .bind(item_id)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    async fn write_attachment(
        &mut self,
        conn: &mut SqliteConnection,
        parent_item_id: i64,
        path: &Path,
        attachment: &AttachmentRef,
    ) -> Result<i64> {
        let item_type_id = self.vocabulary.item_type_id(ATTACHMENT_ITEM_TYPE)?;
        let now = store_timestamp(None);
        let key = self.keys.generate();

        let attachment_id = sqlx::query(
            "INSERT INTO items \
             (itemTypeID, libraryID, key, dateAdded, dateModified, version, synced) \
             VALUES (?, ?, ?, ?, ?, 0, 0)",
        )
        .bind(item_type_id)
        .bind(self.library_id)
        .bind(key.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        sqlx::query(
            "INSERT INTO itemAttachments (itemID, parentItemID, linkMode, contentType, path) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(attachment_id)
        .bind(parent_item_id)
        .bind(LINK_MODE_LINKED_FILE)
        .bind(content_type(path))
        .bind(path.to_string_lossy().into_owned())
        .execute(&mut *conn)
        .await?;

        self.set_field(conn, attachment_id, "title", &attachment.caption)
            .await?;
        Ok(attachment_id)
    }
}

/// Per-file error for an attachment that produced no usable path.
pub(crate) fn file_error(source_id: &str, outcome: &FileOutcome) -> ImportError {
    let message = match outcome {
        FileOutcome::Missing(path) => format!("file not found: {}", path.display()),
        FileOutcome::Failed { source, reason } => {
            format!("{}: {reason}", source.display())
        }
        FileOutcome::Placed(_) | FileOutcome::Linked(_) => "file not usable".to_string(),
    };
    ImportError::new(ImportErrorKind::File, source_id, message)
}

/// Maps a publication entry that could not even be decoded.
pub fn malformed(label: String, reason: &str) -> RecordOutcome {
    RecordOutcome::Failed {
        source_id: label,
        reason: format!("malformed publication: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::zotero::count_rows;
    use crate::adapters::zotero::schema::bootstrap;
    use crate::core::import::summary::FileStats;
    use serde_json::json;
    use sqlx::Connection;
    use tempfile::TempDir;

    async fn store() -> SqliteConnection {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        bootstrap(&mut conn).await.unwrap();
        conn
    }

    async fn importer(
        conn: &mut SqliteConnection,
        collections: HashMap<String, i64>,
        organizer: FileOrganizer,
    ) -> RecordImporter {
        let vocabulary = Vocabulary::load(conn).await.unwrap();
        RecordImporter::new(
            1,
            vocabulary,
            collections,
            KeyGenerator::with_seed(11),
            organizer,
            false,
        )
    }

    fn doc(value: serde_json::Value) -> SourceDocument {
        serde_json::from_value(value).unwrap()
    }

    fn no_files() -> FileOrganizer {
        FileOrganizer::new(None, None, 10, false)
    }

    #[tokio::test]
    async fn test_full_record() {
        let mut conn = store().await;
        let mut importer = importer(&mut conn, HashMap::new(), no_files()).await;

        let outcome = importer
            .import(
                &mut conn,
                &doc(json!({
                    "uuid": "P-1",
                    "type": "article",
                    "title": "The Selfish Gene",
                    "created_at": "2010-04-01T09:30:00",
                    "authors": ["Dawkins, Richard", {"prename": "A.", "surname": "Editor", "type": "editor"}],
                    "keywords": ["evolution", {"name": "evolution"}, "  "],
                    "flagged": true
                })),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, RecordOutcome::Imported { attachments: 0, .. }));

        let (type_name, date_added): (String, String) = sqlx::query_as(
            "SELECT t.typeName, i.dateAdded FROM items i JOIN itemTypes t USING (itemTypeID)",
        )
        .fetch_one(&mut conn)
        .await
        .unwrap();
        assert_eq!(type_name, "journalArticle");
        assert_eq!(date_added, "2010-04-01 09:30:00");

        assert_eq!(count_rows(&mut conn, "itemCreators").await.unwrap(), 2);
        let tags: Vec<String> = sqlx::query_scalar(
            "SELECT t.name FROM itemTags it JOIN tags t USING (tagID) ORDER BY t.name",
        )
        .fetch_all(&mut conn)
        .await
        .unwrap();
        assert_eq!(tags, vec!["Flagged", "evolution"]);

        let extra: String = sqlx::query_scalar(
            "SELECT v.value FROM itemData d JOIN itemDataValues v USING (valueID) \
             JOIN fields f USING (fieldID) WHERE f.fieldName = 'extra'",
        )
        .fetch_one(&mut conn)
        .await
        .unwrap();
        assert_eq!(extra, "Papers3 UUID: P-1");
    }

    #[tokio::test]
    async fn test_unknown_type_falls_back_to_document() {
        let mut conn = store().await;
        let mut importer = importer(&mut conn, HashMap::new(), no_files()).await;
        importer
            .import(&mut conn, &doc(json!({"uuid": "P-1", "type": "podcast"})))
            .await
            .unwrap();

        let type_name: String = sqlx::query_scalar(
            "SELECT t.typeName FROM items i JOIN itemTypes t USING (itemTypeID)",
        )
        .fetch_one(&mut conn)
        .await
        .unwrap();
        assert_eq!(type_name, "document");
    }

    #[tokio::test]
    async fn test_duplicate_source_id_fails_second_record() {
        let mut conn = store().await;
        let mut importer = importer(&mut conn, HashMap::new(), no_files()).await;
        let record = doc(json!({"uuid": "P-1", "title": "Once"}));

        importer.import(&mut conn, &record).await.unwrap();
        let second = importer.import(&mut conn, &record).await.unwrap();
        assert!(matches!(second, RecordOutcome::Failed { ref source_id, .. } if source_id == "P-1"));
        assert_eq!(count_rows(&mut conn, "items").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_record_leaves_no_rows() {
        let mut conn = store().await;
        sqlx::raw_sql(
            "CREATE TRIGGER reject_poison BEFORE INSERT ON itemDataValues \
             WHEN NEW.value = 'POISON' BEGIN SELECT RAISE(ABORT, 'poisoned value'); END;",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        let mut importer = importer(&mut conn, HashMap::new(), no_files()).await;

        let outcome = importer
            .import(
                &mut conn,
                &doc(json!({
                    "uuid": "P-1",
                    "title": "POISON",
                    "authors": ["Curie, Marie"],
                    "keywords": ["radium"]
                })),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, RecordOutcome::Failed { .. }));

        for table in ["items", "itemData", "creators", "tags", "itemDataValues"] {
            assert_eq!(count_rows(&mut conn, table).await.unwrap(), 0, "{table}");
        }
        assert_eq!(importer.intern_stats(), InternStats::default());
    }

    #[tokio::test]
    async fn test_collection_links() {
        let mut conn = store().await;
        let collection_id = sqlx::query(
            "INSERT INTO collections (collectionName, libraryID, key) VALUES ('Reading', 1, 'ABCD2345')",
        )
        .execute(&mut conn)
        .await
        .unwrap()
        .last_insert_rowid();
        let map = HashMap::from([("C-1".to_string(), collection_id)]);
        let mut importer = importer(&mut conn, map, no_files()).await;

        importer
            .import(
                &mut conn,
                &doc(json!({"uuid": "P-1", "collections": ["C-1", {"collection_uuid": "C-1"}, "C-404"]})),
            )
            .await
            .unwrap();
        assert_eq!(count_rows(&mut conn, "collectionItems").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_attachments_linked_and_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("0A")).unwrap();
        std::fs::write(dir.path().join("0A").join("paper.pdf"), b"%PDF").unwrap();

        let mut conn = store().await;
        let organizer = FileOrganizer::new(Some(dir.path().to_path_buf()), None, 10, false);
        let mut importer = importer(&mut conn, HashMap::new(), organizer).await;

        let outcome = importer
            .import(
                &mut conn,
                &doc(json!({
                    "uuid": "P-1",
                    "pdfs": [
                        {"path": "0A/paper.pdf", "caption": "Main"},
                        {"path": "0B/gone.pdf"}
                    ]
                })),
            )
            .await
            .unwrap();

        match outcome {
            RecordOutcome::Imported {
                attachments,
                file_errors,
                ..
            } => {
                assert_eq!(attachments, 1);
                assert_eq!(file_errors.len(), 1);
                assert_eq!(file_errors[0].kind, ImportErrorKind::File);
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        let (link_mode, content_type, path): (i64, String, String) = sqlx::query_as(
            "SELECT linkMode, contentType, path FROM itemAttachments",
        )
        .fetch_one(&mut conn)
        .await
        .unwrap();
        assert_eq!(link_mode, 2);
        assert_eq!(content_type, "application/pdf");
        assert!(path.ends_with("paper.pdf"));
        assert_eq!(importer.organizer().stats().missing, 1);
    }

    #[tokio::test]
    async fn test_failed_record_forgets_its_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("0A")).unwrap();
        std::fs::write(dir.path().join("0A").join("paper.pdf"), b"%PDF").unwrap();

        let mut conn = store().await;
        sqlx::raw_sql(
            "CREATE TRIGGER reject_attachment BEFORE INSERT ON itemAttachments \
             BEGIN SELECT RAISE(ABORT, 'attachment rejected'); END;",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        let organizer = FileOrganizer::new(Some(dir.path().to_path_buf()), None, 10, false);
        let mut importer = importer(&mut conn, HashMap::new(), organizer).await;

        let outcome = importer
            .import(
                &mut conn,
                &doc(json!({
                    "uuid": "P-1",
                    "pdfs": [{"path": "0B/gone.pdf"}, {"path": "0A/paper.pdf"}]
                })),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, RecordOutcome::Failed { .. }));
        assert_eq!(importer.organizer().stats(), FileStats::default());
        assert!(importer.organizer().missing().is_empty());
    }
}
