//! Integration tests for attachment handling
//!
//! These tests verify organized placement, content-based duplicate
//! detection, the missing file list and dry-run behavior.

mod common;

use common::Fixture;
use papers3_zotero::core::import::{ImportCoordinator, ImportErrorKind, RunOutcome};
use papers3_zotero::domain::MigrationError;
use serde_json::{json, Value};
use std::path::Path;
use tokio::sync::watch;

fn doc(uuid: &str, pdf: &str) -> Value {
    json!({
        "uuid": uuid,
        "title": "Gene Study",
        "type": "article",
        "publication_date": "2001",
        "authors": [{"prename": "Jane", "surname": "Smith"}],
        "pdfs": [{"path": pdf, "caption": "Full Text"}]
    })
}

/// Four publications sharing title, year and author: two distinct files,
/// one byte-identical copy and one missing file.
async fn fixture() -> Fixture {
    let mut fixture = Fixture::new(json!([
        doc("A", "a.pdf"),
        doc("B", "b.pdf"),
        doc("C", "a_copy.pdf"),
        doc("D", "gone.pdf")
    ]))
    .await;

    let files = fixture.path("Files");
    std::fs::create_dir_all(&files).unwrap();
    std::fs::write(files.join("a.pdf"), b"%PDF-1.4 first").unwrap();
    std::fs::write(files.join("b.pdf"), b"%PDF-1.4 second").unwrap();
    std::fs::write(files.join("a_copy.pdf"), b"%PDF-1.4 first").unwrap();

    fixture.config.source.attachments_root = Some(files);
    fixture.config.files.organize = true;
    fixture.config.files.target_root = Some(fixture.path("Organized"));
    fixture
}

async fn run(fixture: &Fixture) -> papers3_zotero::core::import::ImportSummary {
    let (_tx, rx) = watch::channel(false);
    ImportCoordinator::new(fixture.config.clone(), rx)
        .execute()
        .await
        .unwrap()
}

fn organized(fixture: &Fixture, name: &str) -> std::path::PathBuf {
    fixture.path("Organized").join("2001").join("Smith").join(name)
}

#[tokio::test]
async fn test_organize_places_and_deduplicates() {
    let fixture = fixture().await;

    let summary = run(&fixture).await;

    assert_eq!(summary.outcome, RunOutcome::Committed);
    assert_eq!(summary.records_imported, 4);
    assert_eq!(summary.files.found, 3);
    assert_eq!(summary.files.copied, 2);
    assert_eq!(summary.files.duplicates, 1);
    assert_eq!(summary.files.missing, 1);
    assert_eq!(summary.attachments_created, 3);

    let first = organized(&fixture, "Gene Study_2001.pdf");
    let second = organized(&fixture, "Gene Study_2001_2.pdf");
    assert_eq!(std::fs::read(&first).unwrap(), b"%PDF-1.4 first");
    assert_eq!(std::fs::read(&second).unwrap(), b"%PDF-1.4 second");

    let mut store = fixture.open().await;
    let paths: Vec<String> =
        sqlx::query_scalar("SELECT path FROM itemAttachments ORDER BY itemID")
            .fetch_all(store.connection())
            .await
            .unwrap();
    let (link_mode, content_type): (i64, String) =
        sqlx::query_as("SELECT linkMode, contentType FROM itemAttachments LIMIT 1")
            .fetch_one(store.connection())
            .await
            .unwrap();
    store.close().await.unwrap();

    let first = first.to_string_lossy().into_owned();
    let second = second.to_string_lossy().into_owned();
    assert_eq!(paths, vec![first.clone(), second, first]);
    assert_eq!(link_mode, 2);
    assert_eq!(content_type, "application/pdf");
}

#[tokio::test]
async fn test_missing_file_is_logged_not_fatal() {
    let fixture = fixture().await;

    let summary = run(&fixture).await;

    assert!(summary.errors.is_empty());
    assert_eq!(summary.file_errors.len(), 1);
    assert_eq!(summary.file_errors[0].kind, ImportErrorKind::File);
    assert_eq!(summary.file_errors[0].source_id, "D");

    let log = std::fs::read_to_string(&fixture.config.files.missing_log).unwrap();
    assert!(log.trim_end().ends_with("gone.pdf"));
    assert_eq!(log.lines().count(), 1);
}

#[tokio::test]
async fn test_aborted_run_still_writes_missing_log() {
    let mut fixture = Fixture::new(Value::Array(vec![
        doc("A", "gone.pdf"),
        json!({"uuid": "B", "title": "CORRUPT"}),
        doc("C", "never.pdf"),
    ]))
    .await;
    fixture.config.source.attachments_root = Some(fixture.path("Files"));
    std::fs::write(&fixture.config.files.missing_log, "stale.pdf\n").unwrap();
    // Rolling back from inside a statement ends the run-wide transaction.
    fixture
        .execute(
            "CREATE TRIGGER corrupt BEFORE INSERT ON itemDataValues \
             WHEN NEW.value = 'CORRUPT' \
             BEGIN SELECT RAISE(ROLLBACK, 'store corrupted'); END;",
        )
        .await;

    let (_tx, rx) = watch::channel(false);
    let err = ImportCoordinator::new(fixture.config.clone(), rx)
        .execute()
        .await
        .unwrap_err();

    assert!(err.is_unrecoverable());
    assert!(matches!(err, MigrationError::Store(_)));
    let log = std::fs::read_to_string(&fixture.config.files.missing_log).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.trim_end().ends_with("gone.pdf"));
    assert_eq!(fixture.count("items").await, 0);
}

#[tokio::test]
async fn test_rerun_detects_placed_files() {
    let fixture = fixture().await;

    run(&fixture).await;
    let second = run(&fixture).await;

    assert_eq!(second.files.copied, 0);
    assert_eq!(second.files.duplicates, 3);
}

#[tokio::test]
async fn test_dry_run_copies_nothing() {
    let mut fixture = fixture().await;
    fixture.config.import.dry_run = true;

    let summary = run(&fixture).await;

    assert_eq!(summary.outcome, RunOutcome::RolledBack);
    assert_eq!(summary.files.copied, 2);
    assert!(!fixture.path("Organized").exists());
    assert_eq!(fixture.count("itemAttachments").await, 0);
}

#[tokio::test]
async fn test_files_only_never_opens_store() {
    let mut fixture = fixture().await;
    fixture.config.import.files_only = true;
    fixture.config.files.organize = false;
    fixture.config.store.path = fixture.path("absent.sqlite");

    let summary = run(&fixture).await;

    assert_eq!(summary.outcome, RunOutcome::FilesOnly);
    assert_eq!(summary.files.copied, 2);
    assert!(organized(&fixture, "Gene Study_2001.pdf").is_file());
    assert!(!Path::new(&fixture.path("absent.sqlite")).exists());
}

#[tokio::test]
async fn test_skip_attachments() {
    let mut fixture = fixture().await;
    fixture.config.files.organize = false;
    fixture.config.import.skip_attachments = true;

    let summary = run(&fixture).await;

    assert_eq!(summary.records_imported, 4);
    assert_eq!(summary.attachments_created, 0);
    assert_eq!(summary.files.found, 0);
    assert_eq!(fixture.count("itemAttachments").await, 0);
}

#[tokio::test]
async fn test_linked_in_place_without_organizing() {
    let mut fixture = fixture().await;
    fixture.config.files.organize = false;

    let summary = run(&fixture).await;

    assert_eq!(summary.attachments_created, 3);
    assert_eq!(summary.files.copied, 0);
    assert!(!fixture.path("Organized").exists());

    let mut store = fixture.open().await;
    let path: String = sqlx::query_scalar("SELECT path FROM itemAttachments ORDER BY itemID LIMIT 1")
        .fetch_one(store.connection())
        .await
        .unwrap();
    store.close().await.unwrap();
    assert_eq!(Path::new(&path), fixture.path("Files").join("a.pdf"));
}
