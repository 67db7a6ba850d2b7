//! Zotero store connection
//!
//! One SQLite connection per run. The migration never pools: every write
//! of a run goes through a single transaction on this connection, so no
//! second writer can interleave with the check-then-insert sequences.

use crate::config::StoreConfig;
use crate::domain::{MigrationError, Result, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection, Sqlite, SqliteConnection, Transaction};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An open destination store
pub struct ZoteroStore {
    conn: SqliteConnection,
    path: PathBuf,
    library_id: i64,
}

impl ZoteroStore {
    /// Opens an existing store.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::StoreNotFound`] if the file does not exist,
    /// and a connection error if SQLite cannot open it.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        if !config.path.is_file() {
            return Err(MigrationError::StoreNotFound(format!(
                "{} does not exist",
                config.path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(false)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        Self::connect(options, config).await
    }

    /// Creates a new store file with the bootstrap schema.
    ///
    /// Used for scratch stores; an existing file is opened and bootstrapped
    /// in place.
    pub async fn create(config: &StoreConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let mut store = Self::connect(options, config).await?;
        super::schema::bootstrap(&mut store.conn).await?;
        Ok(store)
    }

    async fn connect(options: SqliteConnectOptions, config: &StoreConfig) -> Result<Self> {
        let conn = options.connect().await.map_err(|e| {
            StoreError::ConnectionFailed(format!("{}: {e}", config.path.display()))
        })?;

        tracing::debug!(
            path = %config.path.display(),
            library_id = config.library_id,
            "Store opened"
        );

        Ok(Self {
            conn,
            path: config.path.clone(),
            library_id: config.library_id,
        })
    }

    /// Library that receives imported records
    pub fn library_id(&self) -> i64 {
        self.library_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Direct access for reads outside a transaction
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    /// Starts the run-wide transaction.
    pub async fn begin(&mut self) -> Result<Transaction<'_, Sqlite>> {
        self.conn.begin().await.map_err(transaction_failed("begin"))
    }

    /// Closes the connection.
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("close: {e}")))?;
        tracing::debug!(path = %self.path.display(), "Store closed");
        Ok(())
    }
}

/// Opens a savepoint nested in the current transaction.
pub async fn savepoint(conn: &mut SqliteConnection) -> Result<Transaction<'_, Sqlite>> {
    conn.begin().await.map_err(transaction_failed("savepoint"))
}

/// Maps a failure of transaction control itself; such failures abort the run.
pub fn transaction_failed(stage: &'static str) -> impl FnOnce(sqlx::Error) -> MigrationError {
    move |e| StoreError::TransactionFailed(format!("{stage}: {e}")).into()
}

/// Counts rows of a table. Table names come from code, never from input.
pub async fn count_rows(conn: &mut SqliteConnection, table: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
