//! §4.3: semantic recall with context boosting and reward-weighted ranking.

use std::path::Path;

use serde_json::Value;

use crate::domain::solution::{Category, Scope};
use crate::error::Error;
use crate::fingerprint;
use crate::store::{vector, Store};
use crate::{embedding, Result};

/// Default result count, per §4.3.
pub const DEFAULT_LIMIT: i64 = 5;
/// Default similarity floor, per §4.3.
pub const DEFAULT_MIN_SCORE: f32 = 0.3;

const SAME_REPO_BOOST: f32 = 1.15;
const SIMILAR_STACK_BOOST: f32 = 1.08;
const SIMILAR_STACK_THRESHOLD: f32 = 0.7;
const BOOST_CAP: f32 = 0.99;

/// Why a row's similarity was boosted, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostTag {
    SameRepo,
    SimilarStack,
}

/// A recall request.
#[derive(Debug, Clone, Default)]
pub struct RecallQuery {
    pub query: String,
    pub limit: Option<i64>,
    pub min_score: Option<f32>,
    pub scope_filter: Option<Scope>,
    pub category_filter: Option<Category>,
    pub max_complexity: Option<i64>,
}

/// One ranked recall hit, enriched with the fields a caller needs to decide
/// whether and how to apply it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecallResult {
    pub id: String,
    pub problem: String,
    pub solution: String,
    pub scope: Scope,
    pub tags: Vec<String>,
    pub similarity: f32,
    pub score: f32,
    pub uses: i64,
    pub success_rate: f32,
    pub boost_tag: Option<BoostTag>,
    pub category: Option<Category>,
    pub complexity: Option<i64>,
    pub prerequisites: Vec<String>,
    pub anti_patterns: Vec<String>,
    pub code_blocks: Vec<Value>,
    pub related_solutions: Vec<String>,
    pub superseded_by: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
    id: String,
    repo_id: Option<String>,
    problem: String,
    solution: String,
    scope: String,
    tags: String,
    score: f64,
    uses: i64,
    successes: i64,
    failures: i64,
    category: Option<String>,
    complexity: Option<i64>,
    prerequisites: String,
    anti_patterns: String,
    code_blocks: String,
    related_solutions: String,
    problem_embedding: Vec<u8>,
    fingerprint_embedding: Option<Vec<u8>>,
}

struct Candidate {
    id: String,
    repo_id: Option<String>,
    problem: String,
    solution: String,
    scope: Scope,
    tags: Vec<String>,
    score: f32,
    uses: i64,
    successes: i64,
    failures: i64,
    category: Option<Category>,
    complexity: Option<i64>,
    prerequisites: Vec<String>,
    anti_patterns: Vec<String>,
    code_blocks: Vec<Value>,
    related_solutions: Vec<String>,
    embedding: Vec<f32>,
    row_repo_fingerprint: Option<Vec<f32>>,
}

/// Run a recall query from `cwd`, applying context boosts relative to the
/// repo detected there, and bump `uses`/`last_used_at` on every returned row.
pub async fn recall(store: &Store, cwd: &Path, query: RecallQuery) -> Result<Vec<RecallResult>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).max(0);
    let min_score = query.min_score.unwrap_or(DEFAULT_MIN_SCORE);

    let current_repo = fingerprint::detect_and_save(store, cwd).await?;
    let query_embedding = embedding::embed(&query.query);

    let candidates = fetch_candidates(store, &query).await?;

    let mut scored: Vec<(f32, Option<BoostTag>, Candidate)> = Vec::new();
    for candidate in candidates {
        let mut sim = match embedding::cosine(&query_embedding, &candidate.embedding) {
            Ok(sim) => sim,
            Err(err) if err.is_dimension_mismatch() => continue,
            Err(err) => return Err(err),
        };

        let boost_tag = if candidate.repo_id.as_deref() == Some(current_repo.id.as_str()) {
            sim *= SAME_REPO_BOOST;
            Some(BoostTag::SameRepo)
        } else if let (Some(cur_fp), Some(row_fp)) = (
            current_repo.fingerprint_embedding.as_ref(),
            candidate.row_repo_fingerprint.as_ref(),
        ) {
            if embedding::cosine(cur_fp, row_fp)? > SIMILAR_STACK_THRESHOLD {
                sim *= SIMILAR_STACK_BOOST;
                Some(BoostTag::SimilarStack)
            } else {
                None
            }
        } else {
            None
        };

        let sim = sim.min(BOOST_CAP);
        if sim >= min_score {
            scored.push((sim, boost_tag, candidate));
        }
    }

    scored.sort_by(|a, b| {
        let rank_a = a.0 * a.2.score;
        let rank_b = b.0 * b.2.score;
        rank_b
            .partial_cmp(&rank_a)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

    if scored.is_empty() {
        return Ok(Vec::new());
    }

    let mut tx = store.pool().begin().await?;
    let now = chrono::Utc::now();
    for (_, _, candidate) in &scored {
        sqlx::query("UPDATE solutions SET uses = uses + 1, last_used_at = ? WHERE id = ?")
            .bind(now)
            .bind(&candidate.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    let mut results = Vec::with_capacity(scored.len());
    for (sim, boost_tag, candidate) in scored {
        let superseded_by: Option<String> =
            sqlx::query_scalar("SELECT id FROM solutions WHERE supersedes = ? LIMIT 1")
                .bind(&candidate.id)
                .fetch_optional(store.pool())
                .await?;

        let total = candidate.successes + candidate.failures;
        let success_rate = if total == 0 {
            0.5
        } else {
            candidate.successes as f32 / total as f32
        };

        results.push(RecallResult {
            id: candidate.id,
            problem: candidate.problem,
            solution: candidate.solution,
            scope: candidate.scope,
            tags: candidate.tags,
            similarity: (sim * 100_000.0).round() / 100_000.0,
            score: candidate.score,
            uses: candidate.uses + 1,
            success_rate,
            boost_tag,
            category: candidate.category,
            complexity: candidate.complexity,
            prerequisites: candidate.prerequisites,
            anti_patterns: candidate.anti_patterns,
            code_blocks: candidate.code_blocks,
            related_solutions: candidate.related_solutions,
            superseded_by,
        });
    }

    Ok(results)
}

async fn fetch_candidates(store: &Store, query: &RecallQuery) -> Result<Vec<Candidate>> {
    let mut sql = String::from(
        "SELECT s.id, s.repo_id, s.problem, s.solution, s.scope, s.tags, s.score, s.uses,
                s.successes, s.failures, s.category, s.complexity, s.prerequisites,
                s.anti_patterns, s.code_blocks, s.related_solutions, s.problem_embedding,
                r.fingerprint_embedding
         FROM solutions s
         LEFT JOIN repos r ON s.repo_id = r.id
         WHERE 1 = 1",
    );
    if query.scope_filter.is_some() {
        sql.push_str(" AND s.scope = ?");
    }
    if query.category_filter.is_some() {
        sql.push_str(" AND s.category = ?");
    }
    if query.max_complexity.is_some() {
        sql.push_str(" AND (s.complexity IS NULL OR s.complexity <= ?)");
    }

    let mut q = sqlx::query_as::<_, CandidateRow>(&sql);
    if let Some(scope) = query.scope_filter {
        q = q.bind(scope.to_string());
    }
    if let Some(category) = query.category_filter {
        q = q.bind(category.to_string());
    }
    if let Some(max_complexity) = query.max_complexity {
        q = q.bind(max_complexity);
    }

    let rows = q.fetch_all(store.pool()).await?;

    let mut candidates = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(embedding) = vector::decode(&row.problem_embedding) else {
            continue;
        };
        let scope = row.scope.parse().map_err(|_: Error| {
            Error::SchemaMismatch(format!(
                "invalid scope '{}' on solution {}",
                row.scope, row.id
            ))
        })?;
        candidates.push(Candidate {
            id: row.id,
            repo_id: row.repo_id,
            problem: row.problem,
            solution: row.solution,
            scope,
            tags: serde_json::from_str(&row.tags)?,
            score: row.score as f32,
            uses: row.uses,
            successes: row.successes,
            failures: row.failures,
            category: row.category.map(|c| c.parse()).transpose()?,
            complexity: row.complexity,
            prerequisites: serde_json::from_str(&row.prerequisites)?,
            anti_patterns: serde_json::from_str(&row.anti_patterns)?,
            code_blocks: serde_json::from_str(&row.code_blocks)?,
            related_solutions: serde_json::from_str(&row.related_solutions)?,
            embedding,
            row_repo_fingerprint: row.fingerprint_embedding.and_then(|b| vector::decode(&b)),
        });
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::solution::NewSolution;
    use crate::memory::store_solution;

    #[tokio::test]
    async fn recall_finds_a_stored_solution_above_threshold() {
        let store = Store::open_in_memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();

        store_solution::store_solution(
            &store,
            NewSolution {
                problem: "OAuth refresh token rotation".to_string(),
                solution: "Use refresh_token grant with client_assertion".to_string(),
                scope: Some(Scope::Global),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let results = recall(
            &store,
            dir.path(),
            RecallQuery {
                query: "oauth refresh".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].similarity >= DEFAULT_MIN_SCORE);
        assert_eq!(results[0].uses, 1);
    }

    #[tokio::test]
    async fn recall_filters_out_rows_below_min_score() {
        let store = Store::open_in_memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();

        store_solution::store_solution(
            &store,
            NewSolution {
                problem: "completely unrelated subject matter".to_string(),
                solution: "n/a".to_string(),
                scope: Some(Scope::Global),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let results = recall(
            &store,
            dir.path(),
            RecallQuery {
                query: "oauth refresh token".to_string(),
                min_score: Some(0.95),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn recall_ranks_same_repo_solution_first_and_tags_it() {
        let store = Store::open_in_memory().await.unwrap();
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();

        let repo_a = fingerprint::detect_and_save(&store, dir_a.path()).await.unwrap();
        let repo_b = fingerprint::detect_and_save(&store, dir_b.path()).await.unwrap();

        store_solution::store_solution(
            &store,
            NewSolution {
                repo_id: Some(repo_a.id.clone()),
                problem: "flaky integration test teardown".to_string(),
                solution: "await the pool drain before dropping it".to_string(),
                scope: Some(Scope::Repo),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        store_solution::store_solution(
            &store,
            NewSolution {
                repo_id: Some(repo_b.id.clone()),
                problem: "flaky integration test teardown".to_string(),
                solution: "await the pool drain before dropping it".to_string(),
                scope: Some(Scope::Repo),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let results = recall(
            &store,
            dir_a.path(),
            RecallQuery {
                query: "flaky integration test teardown".to_string(),
                min_score: Some(0.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(results[0].boost_tag, Some(BoostTag::SameRepo));
    }

    #[tokio::test]
    async fn a_higher_score_outranks_an_equal_similarity_row() {
        let store = Store::open_in_memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();

        let low = store_solution::store_solution(
            &store,
            NewSolution {
                problem: "database connection pool exhaustion".to_string(),
                solution: "raise max_connections".to_string(),
                scope: Some(Scope::Global),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let high = store_solution::store_solution(
            &store,
            NewSolution {
                problem: "database connection pool exhaustion".to_string(),
                solution: "raise max_connections".to_string(),
                scope: Some(Scope::Global),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        crate::memory::reward(&store, &high.id, crate::domain::usage_log::Outcome::Success, None)
            .await
            .unwrap();

        let results = recall(
            &store,
            dir.path(),
            RecallQuery {
                query: "database connection pool exhaustion".to_string(),
                min_score: Some(0.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let rank_of = |id: &str| results.iter().position(|r| r.id == id).unwrap();
        assert!(
            rank_of(&high.id) < rank_of(&low.id),
            "the rewarded row's higher score should outrank the equal-similarity row"
        );
    }
}
