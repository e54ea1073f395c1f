//! The embedded relational store: single writer, WAL journaling, foreign
//! keys enforced, parameterized queries only.

pub mod migrator;
pub mod schema;
pub mod vector;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{Error, Result};

/// Owns the single writer connection pool to `matrix.db`.
///
/// Every other subsystem (`memory`, `index`, `scheduler`) takes a `&Store`;
/// none of them open their own connection. Readers may run concurrently with
/// the store's single writer — WAL journaling is what makes that safe.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if absent) the store at `path`, applying every pending
    /// migration before returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fatal`] if the file can't be opened or a migration
    /// fails — per §4.1, schema-mismatch-at-open is not recoverable.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
            .map_err(|e| Error::Fatal(format!("invalid store path {}: {e}", path.display())))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(|e| Error::Fatal(format!("failed to open store {}: {e}", path.display())))?;

        debug!(path = %path.display(), "opened store");
        migrator::migrate(&pool).await?;

        Ok(Self { pool })
    }

    /// Open a private, ephemeral in-memory store. Used by tests and by
    /// anything that wants the schema without durable persistence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fatal`] if migrations fail to apply.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| Error::Fatal(format!("invalid in-memory dsn: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| Error::Fatal(format!("failed to open in-memory store: {e}")))?;

        migrator::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// The underlying connection pool, for modules that need raw query
    /// access (memory engine, indexer, scheduler).
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The currently applied schema version.
    pub async fn schema_version(&self) -> Result<i64> {
        migrator::current_version(&self.pool).await
    }
}
