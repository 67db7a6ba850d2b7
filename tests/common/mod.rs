//! Shared fixtures for integration tests
//!
//! A fixture is a temporary directory holding a catalog, a bootstrapped
//! store and a configuration pointing at both.

#![allow(dead_code)]

use papers3_zotero::adapters::zotero::{count_rows, ZoteroStore};
use papers3_zotero::config::{parse_config, MigrationConfig};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
    pub config: MigrationConfig,
}

impl Fixture {
    /// Creates a catalog with the given publications and an empty store.
    pub async fn new(publications: Value) -> Self {
        let dir = TempDir::new().unwrap();
        let catalog = dir.path().join("catalog");
        std::fs::create_dir_all(&catalog).unwrap();
        std::fs::write(
            catalog.join("papers3_publications_full.json"),
            serde_json::to_string(&serde_json::json!({ "publications": publications })).unwrap(),
        )
        .unwrap();

        let mut config = parse_config("[store]\npath = \"zotero.sqlite\"\n").unwrap();
        config.source.catalog_dir = catalog;
        config.store.path = dir.path().join("zotero.sqlite");
        config.files.missing_log = dir.path().join("missing_files.log");
        config.logging.local_enabled = false;

        ZoteroStore::create(&config.store)
            .await
            .unwrap()
            .close()
            .await
            .unwrap();

        Self { dir, config }
    }

    /// Writes the collections document next to the publications.
    pub fn with_collections(self, collections: Value) -> Self {
        std::fs::write(
            self.config.source.catalog_dir.join("papers3_collections.json"),
            serde_json::to_string(&serde_json::json!({ "collections": collections })).unwrap(),
        )
        .unwrap();
        self
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub async fn open(&self) -> ZoteroStore {
        ZoteroStore::open(&self.config.store).await.unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        let mut store = self.open().await;
        let n = count_rows(store.connection(), table).await.unwrap();
        store.close().await.unwrap();
        n
    }

    /// Runs a statement against the store outside any import.
    pub async fn execute(&self, sql: &str) {
        let mut store = self.open().await;
        sqlx::raw_sql(sql).execute(store.connection()).await.unwrap();
        store.close().await.unwrap();
    }
}

/// `n` plain publications with identifiers `P-1` through `P-n`.
pub fn publications(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| {
            serde_json::json!({
                "uuid": format!("P-{i}"),
                "title": format!("Publication {i}"),
                "type": "journal article",
                "publication_date": format!("99{}0300000000000000000222000", 1990 + i),
                "authors": [{"prename": "Ada", "surname": format!("Author{i}"), "type": "author"}],
                "keywords": [{"name": "shared"}]
            })
        })
        .collect()
}
