//! `doctor`: a read-only health check over the store (schema version, row
//! counts, WAL checkpoint state, grammar cache presence).

use serde::Serialize;

use crate::index::{grammar_cache, languages};
use crate::paths::Layout;
use crate::store::migrator;
use crate::{Result, Store};

/// Row counts for the tables an operator cares about at a glance.
#[derive(Debug, Clone, Serialize)]
pub struct TableCounts {
    pub repos: i64,
    pub solutions: i64,
    pub failures: i64,
    pub repo_files: i64,
    pub symbols: i64,
    pub tasks: i64,
    pub executions: i64,
}

/// One language's compiled-in grammar cache status.
#[derive(Debug, Clone, Serialize)]
pub struct GrammarStatus {
    pub language: String,
    pub cached: bool,
}

/// The full `doctor` report.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub schema_version: i64,
    pub expected_schema_version: i64,
    pub counts: TableCounts,
    pub wal_checkpoint_busy: bool,
    pub grammars: Vec<GrammarStatus>,
}

impl DoctorReport {
    /// Whether anything in this report should concern an operator: a schema
    /// behind the binary's known version, or a stuck WAL checkpoint.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.schema_version == self.expected_schema_version && !self.wal_checkpoint_busy
    }
}

/// Run every health check against `store`/`layout`. Read-only: never
/// mutates application tables (migrations are expected to have already
/// run at `Store::open` time).
pub async fn run_doctor(store: &Store, layout: &Layout) -> Result<DoctorReport> {
    let schema_version = migrator::current_version(store.pool()).await?;
    let counts = count_tables(store).await?;
    let wal_checkpoint_busy = wal_checkpoint_busy(store).await?;
    let grammars = grammar_statuses(layout);

    Ok(DoctorReport {
        schema_version,
        expected_schema_version: crate::store::schema::SCHEMA_VERSION,
        counts,
        wal_checkpoint_busy,
        grammars,
    })
}

async fn count_tables(store: &Store) -> Result<TableCounts> {
    async fn count(store: &Store, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        Ok(sqlx::query_scalar(&sql).fetch_one(store.pool()).await?)
    }

    Ok(TableCounts {
        repos: count(store, "repos").await?,
        solutions: count(store, "solutions").await?,
        failures: count(store, "failures").await?,
        repo_files: count(store, "repo_files").await?,
        symbols: count(store, "symbols").await?,
        tasks: count(store, "tasks").await?,
        executions: count(store, "executions").await?,
    })
}

/// `PRAGMA wal_checkpoint(PASSIVE)` reports `busy` as its first column: 1 if
/// another connection is blocking a full checkpoint, 0 otherwise.
async fn wal_checkpoint_busy(store: &Store) -> Result<bool> {
    let row: (i64, i64, i64) = sqlx::query_as("PRAGMA wal_checkpoint(PASSIVE)")
        .fetch_one(store.pool())
        .await?;
    Ok(row.0 != 0)
}

fn grammar_statuses(layout: &Layout) -> Vec<GrammarStatus> {
    languages::registry()
        .iter()
        .map(|parser| {
            let language = parser.name().to_string();
            let cached = grammar_cache::is_cached(&layout.grammars_dir(), &language);
            GrammarStatus { language, cached }
        })
        .collect()
}
