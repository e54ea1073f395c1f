//! §4.4: persist a new reusable problem -> fix pair.

use chrono::Utc;

use crate::domain::ids;
use crate::domain::solution::{NewSolution, Scope, Solution};
use crate::store::vector;
use crate::{embedding, Result, Store};

/// Compute `problem_embedding` from `input.problem` and persist a new
/// solution row. Returns the fully-populated [`Solution`].
pub async fn store_solution(store: &Store, input: NewSolution) -> Result<Solution> {
    let id = ids::generate("sol");
    let scope = input.scope.unwrap_or(Scope::Global);
    let embedding = embedding::embed(&input.problem);
    let blob = vector::encode(&embedding);
    let now = Utc::now();

    let tags = serde_json::to_string(&input.tags)?;
    let context = serde_json::to_string(&input.context.clone().unwrap_or(serde_json::json!({})))?;
    let prerequisites = serde_json::to_string(&input.prerequisites)?;
    let anti_patterns = serde_json::to_string(&input.anti_patterns)?;
    let code_blocks = serde_json::to_string(&input.code_blocks)?;
    let related_solutions = serde_json::to_string(&input.related_solutions)?;

    sqlx::query(
        "INSERT INTO solutions
         (id, repo_id, problem, problem_embedding, solution, scope, tags, context,
          score, category, complexity, prerequisites, anti_patterns, code_blocks,
          related_solutions, supersedes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0.5, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&input.repo_id)
    .bind(&input.problem)
    .bind(blob)
    .bind(&input.solution)
    .bind(scope.to_string())
    .bind(tags)
    .bind(context)
    .bind(input.category.map(|c| c.to_string()))
    .bind(input.complexity)
    .bind(prerequisites)
    .bind(anti_patterns)
    .bind(code_blocks)
    .bind(related_solutions)
    .bind(&input.supersedes)
    .bind(now)
    .bind(now)
    .execute(store.pool())
    .await?;

    Ok(Solution {
        id,
        repo_id: input.repo_id,
        problem: input.problem,
        problem_embedding: embedding,
        solution: input.solution,
        scope,
        tags: input.tags,
        context: input.context.unwrap_or(serde_json::json!({})),
        score: 0.5,
        uses: 0,
        successes: 0,
        partial_successes: 0,
        failures: 0,
        category: input.category,
        complexity: input.complexity,
        prerequisites: input.prerequisites,
        anti_patterns: input.anti_patterns,
        code_blocks: input.code_blocks,
        related_solutions: input.related_solutions,
        supersedes: input.supersedes,
        created_at: now,
        updated_at: now,
        last_used_at: None,
        promoted_to_skill: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_solution_generates_a_prefixed_id_and_default_score() {
        let store = Store::open_in_memory().await.unwrap();
        let solution = store_solution(
            &store,
            NewSolution {
                problem: "connection pool exhaustion under load".to_string(),
                solution: "raise max_connections and add a semaphore".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(solution.id.starts_with("sol_"));
        assert_eq!(solution.score, 0.5);
        assert_eq!(solution.scope, Scope::Global);
        assert_eq!(
            solution.problem_embedding.len(),
            crate::embedding::DIMENSION
        );
    }

    #[tokio::test]
    async fn store_solution_persists_the_chosen_scope() {
        let store = Store::open_in_memory().await.unwrap();
        let solution = store_solution(
            &store,
            NewSolution {
                problem: "p".to_string(),
                solution: "s".to_string(),
                scope: Some(Scope::Stack),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let row: (String,) = sqlx::query_as("SELECT scope FROM solutions WHERE id = ?")
            .bind(&solution.id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(row.0, "stack");
    }
}
