//! Destination schema bootstrap
//!
//! Creates the part of the Zotero schema the migration reads and writes,
//! with the same uniqueness constraints, and seeds the type, field and
//! creator-role vocabularies using Zotero's own identifiers. Real Zotero
//! databases already carry all of this; the bootstrap is for scratch stores
//! and tests.

use crate::domain::Result;
use sqlx::SqliteConnection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS itemTypes (
    itemTypeID INTEGER PRIMARY KEY,
    typeName TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS fields (
    fieldID INTEGER PRIMARY KEY,
    fieldName TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS creatorTypes (
    creatorTypeID INTEGER PRIMARY KEY,
    creatorType TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS items (
    itemID INTEGER PRIMARY KEY,
    itemTypeID INT NOT NULL,
    dateAdded TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    dateModified TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    clientDateModified TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    libraryID INT NOT NULL,
    key TEXT NOT NULL,
    version INT NOT NULL DEFAULT 0,
    synced INT NOT NULL DEFAULT 0,
    UNIQUE (libraryID, key),
    FOREIGN KEY (itemTypeID) REFERENCES itemTypes(itemTypeID)
);
CREATE TABLE IF NOT EXISTS itemDataValues (
    valueID INTEGER PRIMARY KEY,
    value UNIQUE
);
CREATE TABLE IF NOT EXISTS itemData (
    itemID INT,
    fieldID INT,
    valueID,
    PRIMARY KEY (itemID, fieldID),
    FOREIGN KEY (itemID) REFERENCES items(itemID) ON DELETE CASCADE,
    FOREIGN KEY (fieldID) REFERENCES fields(fieldID),
    FOREIGN KEY (valueID) REFERENCES itemDataValues(valueID)
);
CREATE TABLE IF NOT EXISTS creators (
    creatorID INTEGER PRIMARY KEY,
    firstName TEXT,
    lastName TEXT,
    fieldMode INT,
    UNIQUE (lastName, firstName, fieldMode)
);
CREATE TABLE IF NOT EXISTS itemCreators (
    itemID INT NOT NULL,
    creatorID INT NOT NULL,
    creatorTypeID INT NOT NULL DEFAULT 1,
    orderIndex INT NOT NULL DEFAULT 0,
    PRIMARY KEY (itemID, orderIndex),
    UNIQUE (itemID, creatorID, creatorTypeID),
    FOREIGN KEY (itemID) REFERENCES items(itemID) ON DELETE CASCADE,
    FOREIGN KEY (creatorID) REFERENCES creators(creatorID) ON DELETE CASCADE,
    FOREIGN KEY (creatorTypeID) REFERENCES creatorTypes(creatorTypeID)
);
CREATE TABLE IF NOT EXISTS tags (
    tagID INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS itemTags (
    itemID INT NOT NULL,
    tagID INT NOT NULL,
    type INT NOT NULL,
    PRIMARY KEY (itemID, tagID),
    FOREIGN KEY (itemID) REFERENCES items(itemID) ON DELETE CASCADE,
    FOREIGN KEY (tagID) REFERENCES tags(tagID) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS collections (
    collectionID INTEGER PRIMARY KEY,
    collectionName TEXT NOT NULL,
    parentCollectionID INT DEFAULT NULL,
    clientDateModified TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    libraryID INT NOT NULL,
    key TEXT NOT NULL,
    version INT NOT NULL DEFAULT 0,
    synced INT NOT NULL DEFAULT 0,
    UNIQUE (libraryID, key),
    FOREIGN KEY (parentCollectionID) REFERENCES collections(collectionID) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS collectionItems (
    collectionID INT NOT NULL,
    itemID INT NOT NULL,
    orderIndex INT NOT NULL DEFAULT 0,
    PRIMARY KEY (collectionID, itemID),
    FOREIGN KEY (collectionID) REFERENCES collections(collectionID) ON DELETE CASCADE,
    FOREIGN KEY (itemID) REFERENCES items(itemID) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS itemAttachments (
    itemID INTEGER PRIMARY KEY,
    parentItemID INT,
    linkMode INT,
    contentType TEXT,
    charsetID INT,
    path TEXT,
    syncState INT DEFAULT 0,
    FOREIGN KEY (itemID) REFERENCES items(itemID) ON DELETE CASCADE,
    FOREIGN KEY (parentItemID) REFERENCES items(itemID) ON DELETE CASCADE
);
"#;

/// Item types with Zotero's identifiers.
pub const ITEM_TYPES: &[(i64, &str)] = &[
    (1, "note"),
    (3, "attachment"),
    (7, "book"),
    (8, "bookSection"),
    (11, "conferencePaper"),
    (14, "document"),
    (22, "journalArticle"),
    (29, "patent"),
    (34, "report"),
    (37, "thesis"),
    (40, "webpage"),
];

/// Fields with Zotero's identifiers.
pub const FIELDS: &[(i64, &str)] = &[
    (1, "title"),
    (2, "abstractNote"),
    (5, "publicationTitle"),
    (6, "date"),
    (7, "place"),
    (13, "url"),
    (16, "extra"),
    (19, "volume"),
    (20, "publisher"),
    (32, "pages"),
    (59, "DOI"),
    (65, "accessDate"),
    (69, "ISBN"),
    (71, "ISSN"),
    (76, "issue"),
    (78, "language"),
    (115, "shortTitle"),
];

/// Creator roles with Zotero's identifiers.
pub const CREATOR_TYPES: &[(i64, &str)] = &[
    (2, "contributor"),
    (8, "author"),
    (10, "editor"),
    (11, "translator"),
];

/// Creates missing tables and seeds the vocabularies. Safe to run twice.
pub async fn bootstrap(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::raw_sql(SCHEMA_SQL).execute(&mut *conn).await?;

    for (id, name) in ITEM_TYPES {
        sqlx::query("INSERT OR IGNORE INTO itemTypes (itemTypeID, typeName) VALUES (?, ?)")
            .bind(*id)
            .bind(*name)
            .execute(&mut *conn)
            .await?;
    }
    for (id, name) in FIELDS {
        sqlx::query("INSERT OR IGNORE INTO fields (fieldID, fieldName) VALUES (?, ?)")
            .bind(*id)
            .bind(*name)
            .execute(&mut *conn)
            .await?;
    }
    for (id, name) in CREATOR_TYPES {
        sqlx::query(
            "INSERT OR IGNORE INTO creatorTypes (creatorTypeID, creatorType) VALUES (?, ?)",
        )
        .bind(*id)
        .bind(*name)
        .execute(&mut *conn)
        .await?;
    }

    tracing::debug!(
        item_types = ITEM_TYPES.len(),
        fields = FIELDS.len(),
        creator_types = CREATOR_TYPES.len(),
        "Destination schema bootstrapped"
    );
    Ok(())
}
