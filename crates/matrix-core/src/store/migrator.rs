//! Forward-only migration runner.
//!
//! On open, reads the highest applied version from `schema_migrations`
//! (bootstrapping that table if it doesn't exist yet) and applies every
//! later entry in [`super::schema::MIGRATIONS`], one transaction per
//! migration. Idempotent: re-running after a partial-then-successful run
//! only applies the entries still missing from `schema_migrations`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use super::schema::MIGRATIONS;
use crate::error::{Error, Result};

const BOOTSTRAP: &str = r"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);
";

/// Apply every migration in [`MIGRATIONS`] not yet recorded in
/// `schema_migrations`, in ascending version order.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(BOOTSTRAP)
        .execute(pool)
        .await
        .map_err(|e| Error::Fatal(format!("failed to bootstrap schema_migrations: {e}")))?;

    let current: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .map_err(|e| Error::Fatal(format!("failed to read schema version: {e}")))?;
    let current = current.unwrap_or(0);

    debug!(current_version = current, "starting migration check");

    for &(version, sql) in MIGRATIONS {
        if version <= current {
            continue;
        }

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| Error::Fatal(format!("failed to open migration transaction: {e}")))?;

        sqlx::raw_sql(sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Fatal(format!("migration {version} failed: {e}")))?;

        sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
            .bind(version)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Fatal(format!("failed to record migration {version}: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| Error::Fatal(format!("failed to commit migration {version}: {e}")))?;

        info!(version, "applied migration");
    }

    Ok(())
}

/// The highest version recorded in `schema_migrations`, or 0 if none.
pub async fn current_version(pool: &SqlitePool) -> Result<i64> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .map_err(|e| Error::Fatal(format!("failed to read schema version: {e}")))?;
    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool")
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let pool = memory_pool().await;
        migrate(&pool).await.expect("first run");
        migrate(&pool).await.expect("second run is a no-op");
        assert_eq!(
            current_version(&pool).await.unwrap(),
            super::super::schema::SCHEMA_VERSION
        );
    }

    #[tokio::test]
    async fn fresh_build_matches_stepwise_migration_structurally() {
        let stepwise = memory_pool().await;
        migrate(&stepwise).await.expect("stepwise migrate");

        let fresh = memory_pool().await;
        let all_ddl = MIGRATIONS.iter().map(|(_, sql)| *sql).collect::<Vec<_>>().join("\n");
        sqlx::raw_sql(&all_ddl).execute(&fresh).await.expect("single-pass build");

        let mut tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name != 'schema_migrations' ORDER BY name")
                .fetch_all(&stepwise)
                .await
                .unwrap();
        tables.retain(|t| t != "schema_migrations");

        for table in &tables {
            let stepwise_cols: Vec<(String, String, i64)> =
                sqlx::query_as(&format!("SELECT name, type, dflt_value IS NOT NULL AS has_default FROM pragma_table_info('{table}')"))
                    .fetch_all(&stepwise)
                    .await
                    .unwrap();
            let fresh_cols: Vec<(String, String, i64)> =
                sqlx::query_as(&format!("SELECT name, type, dflt_value IS NOT NULL AS has_default FROM pragma_table_info('{table}')"))
                    .fetch_all(&fresh)
                    .await
                    .unwrap();
            assert_eq!(stepwise_cols, fresh_cols, "columns differ for table {table}");

            let stepwise_indexes: Vec<String> =
                sqlx::query_scalar(&format!("SELECT name FROM pragma_index_list('{table}') ORDER BY name"))
                    .fetch_all(&stepwise)
                    .await
                    .unwrap();
            let fresh_indexes: Vec<String> =
                sqlx::query_scalar(&format!("SELECT name FROM pragma_index_list('{table}') ORDER BY name"))
                    .fetch_all(&fresh)
                    .await
                    .unwrap();
            assert_eq!(stepwise_indexes, fresh_indexes, "indexes differ for table {table}");
        }
    }

    #[tokio::test]
    async fn migrate_creates_every_table() {
        let pool = memory_pool().await;
        migrate(&pool).await.expect("migrate");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for expected in [
            "repos",
            "solutions",
            "failures",
            "usage_log",
            "warnings",
            "repo_files",
            "symbols",
            "imports",
            "tasks",
            "executions",
            "api_cache",
            "schema_migrations",
        ] {
            assert!(
                tables.iter().any(|t| t == expected),
                "missing table {expected}"
            );
        }
    }
}
