//! Warning CRUD: standing grudges against a file glob or package, with
//! NULL-aware repo-vs-global matching (§3, §8.10).

use chrono::Utc;

use crate::domain::ids;
use crate::domain::warning::{Severity, Warning, WarningType};
use crate::Result;
use crate::Store;

/// Input accepted by [`add`].
#[derive(Debug, Clone, Default)]
pub struct NewWarning {
    pub warning_type: WarningType,
    pub target: String,
    pub ecosystem: Option<String>,
    pub reason: String,
    pub severity: Option<Severity>,
    pub repo_id: Option<String>,
}

/// Insert a warning. Unique on `(type, target, ecosystem, repo_id)` with
/// NULL-aware matching — enforced by the schema's `COALESCE`-based index.
pub async fn add(store: &Store, input: NewWarning) -> Result<Warning> {
    let id = ids::generate("warn");
    let severity = input.severity.unwrap_or(Severity::Warn);
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO warnings (id, type, target, ecosystem, reason, severity, repo_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(input.warning_type.to_string())
    .bind(&input.target)
    .bind(&input.ecosystem)
    .bind(&input.reason)
    .bind(severity.to_string())
    .bind(&input.repo_id)
    .bind(now)
    .execute(store.pool())
    .await?;

    Ok(Warning {
        id,
        warning_type: input.warning_type,
        target: input.target,
        ecosystem: input.ecosystem,
        reason: input.reason,
        severity,
        repo_id: input.repo_id,
        created_at: now,
    })
}

/// Remove a warning by id.
pub async fn remove(store: &Store, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM warnings WHERE id = ?")
        .bind(id)
        .execute(store.pool())
        .await?;
    Ok(())
}

/// List every warning, optionally scoped to one repo (repo-scoped and
/// global warnings both included when `repo_id` is given).
pub async fn list(store: &Store, repo_id: Option<&str>) -> Result<Vec<Warning>> {
    let rows = row_query(store, None, None, repo_id).await?;
    Ok(rows)
}

/// Look up warnings matching `target`, preferring a repo-scoped warning over
/// a global one when both exist for the same target (§8.10).
pub async fn check(
    store: &Store,
    warning_type: WarningType,
    target: &str,
    repo_id: Option<&str>,
) -> Result<Option<Warning>> {
    let rows = row_query(store, Some(warning_type), Some(target), repo_id).await?;
    Ok(rows
        .into_iter()
        .max_by_key(|w| w.repo_id.is_some() as u8))
}

async fn row_query(
    store: &Store,
    warning_type: Option<WarningType>,
    target: Option<&str>,
    repo_id: Option<&str>,
) -> Result<Vec<Warning>> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: String,
        #[sqlx(rename = "type")]
        warning_type: String,
        target: String,
        ecosystem: Option<String>,
        reason: String,
        severity: String,
        repo_id: Option<String>,
        created_at: chrono::DateTime<Utc>,
    }

    let mut sql = String::from(
        "SELECT id, type, target, ecosystem, reason, severity, repo_id, created_at FROM warnings WHERE 1 = 1",
    );
    if warning_type.is_some() {
        sql.push_str(" AND type = ?");
    }
    if target.is_some() {
        sql.push_str(" AND target = ?");
    }
    if repo_id.is_some() {
        sql.push_str(" AND (repo_id = ? OR repo_id IS NULL)");
    }

    let mut q = sqlx::query_as::<_, Row>(&sql);
    if let Some(warning_type) = warning_type {
        q = q.bind(warning_type.to_string());
    }
    if let Some(target) = target {
        q = q.bind(target.to_string());
    }
    if let Some(repo_id) = repo_id {
        q = q.bind(repo_id.to_string());
    }

    let rows = q.fetch_all(store.pool()).await?;
    let mut warnings = Vec::with_capacity(rows.len());
    for row in rows {
        warnings.push(Warning {
            id: row.id,
            warning_type: row.warning_type.parse()?,
            target: row.target,
            ecosystem: row.ecosystem,
            reason: row.reason,
            severity: row.severity.parse()?,
            repo_id: row.repo_id,
            created_at: row.created_at,
        });
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repo_scoped_warning_wins_over_global_for_the_same_target() {
        let store = Store::open_in_memory().await.unwrap();
        add(
            &store,
            NewWarning {
                warning_type: WarningType::Package,
                target: "left-pad".to_string(),
                reason: "banned globally".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        add(
            &store,
            NewWarning {
                warning_type: WarningType::Package,
                target: "left-pad".to_string(),
                reason: "banned in this repo specifically".to_string(),
                repo_id: Some("repo_abc".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let found = check(&store, WarningType::Package, "left-pad", Some("repo_abc"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.repo_id.as_deref(), Some("repo_abc"));
    }

    #[tokio::test]
    async fn check_returns_none_for_unknown_target() {
        let store = Store::open_in_memory().await.unwrap();
        assert!(check(&store, WarningType::File, "nope.rs", None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn remove_deletes_the_row() {
        let store = Store::open_in_memory().await.unwrap();
        let warning = add(
            &store,
            NewWarning {
                warning_type: WarningType::File,
                target: "secrets.env".to_string(),
                reason: "never commit".to_string(),
                severity: Some(Severity::Block),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        remove(&store, &warning.id).await.unwrap();
        assert!(list(&store, None).await.unwrap().is_empty());
    }
}
