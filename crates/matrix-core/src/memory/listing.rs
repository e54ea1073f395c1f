//! Paginated, embedding-free summaries for the CLI `list` verb. Recall
//! (§4.3) is the ranked, embedding-aware read path; this is the plain
//! "show me what's in the store" path and never touches vector columns.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Result, Store};

#[derive(Debug, Clone, Serialize)]
pub struct SolutionSummary {
    pub id: String,
    pub problem: String,
    pub scope: String,
    pub score: f64,
    pub uses: i64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub id: String,
    pub error_type: String,
    pub error_message: String,
    pub occurrences: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoSummary {
    pub id: String,
    pub name: String,
    pub path: String,
    pub languages: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct SolutionRow {
    id: String,
    problem: String,
    scope: String,
    score: f64,
    uses: i64,
    tags: String,
    created_at: DateTime<Utc>,
}

/// Page through `solutions`, newest first, optionally scoped to one repo.
pub async fn list_solutions(
    store: &Store,
    repo_id: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<SolutionSummary>> {
    let rows: Vec<SolutionRow> = sqlx::query_as(
        "SELECT id, problem, scope, score, uses, tags, created_at FROM solutions
         WHERE (?1 IS NULL OR repo_id = ?1)
         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
    )
    .bind(repo_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(store.pool())
    .await?;

    rows.into_iter()
        .map(|r| {
            Ok(SolutionSummary {
                id: r.id,
                problem: r.problem,
                scope: r.scope,
                score: r.score,
                uses: r.uses,
                tags: serde_json::from_str(&r.tags)?,
                created_at: r.created_at,
            })
        })
        .collect()
}

#[derive(sqlx::FromRow)]
struct FailureRow {
    id: String,
    error_type: String,
    error_message: String,
    occurrences: i64,
    created_at: DateTime<Utc>,
}

/// Page through `failures`, newest first, optionally scoped to one repo.
pub async fn list_failures(
    store: &Store,
    repo_id: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<FailureSummary>> {
    let rows: Vec<FailureRow> = sqlx::query_as(
        "SELECT id, error_type, error_message, occurrences, created_at FROM failures
         WHERE (?1 IS NULL OR repo_id = ?1)
         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
    )
    .bind(repo_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(store.pool())
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| FailureSummary {
            id: r.id,
            error_type: r.error_type,
            error_message: r.error_message,
            occurrences: r.occurrences,
            created_at: r.created_at,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct RepoRow {
    id: String,
    name: String,
    path: String,
    languages: String,
    updated_at: DateTime<Utc>,
}

/// Page through `repos`, most recently updated first.
pub async fn list_repos(store: &Store, limit: i64, offset: i64) -> Result<Vec<RepoSummary>> {
    let rows: Vec<RepoRow> = sqlx::query_as(
        "SELECT id, name, path, languages, updated_at FROM repos
         ORDER BY updated_at DESC LIMIT ?1 OFFSET ?2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(store.pool())
    .await?;

    rows.into_iter()
        .map(|r| {
            Ok(RepoSummary {
                id: r.id,
                name: r.name,
                path: r.path,
                languages: serde_json::from_str(&r.languages)?,
                updated_at: r.updated_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::solution::NewSolution;
    use crate::memory::store_solution;

    #[tokio::test]
    async fn list_solutions_paginates_newest_first() {
        let store = Store::open_in_memory().await.unwrap();
        for i in 0..3 {
            store_solution(
                &store,
                NewSolution {
                    problem: format!("p{i}"),
                    solution: format!("s{i}"),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let page = list_solutions(&store, None, 2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        let next = list_solutions(&store, None, 2, 2).await.unwrap();
        assert_eq!(next.len(), 1);
    }
}
