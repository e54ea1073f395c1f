//! §4.5: reward a solution's outcome, adjusting its score within one
//! transaction that also bumps the matching counter and appends a
//! [`UsageLog`](crate::domain::usage_log::UsageLog) row.

use crate::domain::solution::Solution;
use crate::domain::usage_log::Outcome;
use crate::error::Error;
use crate::{Result, Store};

/// Floor and ceiling on [`Solution::score`]; repeated failures cannot demote
/// a solution below [`SCORE_FLOOR`] (§4.5, §8.4).
pub const SCORE_FLOOR: f32 = 0.1;
pub const SCORE_CEILING: f32 = 1.0;

/// The score before and after a reward, for observability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardOutcome {
    pub previous_score: f32,
    pub new_score: f32,
}

fn apply(score: f32, outcome: Outcome) -> f32 {
    let updated = match outcome {
        Outcome::Success => score + 0.10 * (1.0 - score),
        Outcome::Partial => (score + 0.03).min(SCORE_CEILING),
        Outcome::Failure => (score - 0.15).max(SCORE_FLOOR),
        Outcome::Skipped => score,
    };
    updated.clamp(SCORE_FLOOR, SCORE_CEILING)
}

/// Record `outcome` for `solution_id`: update its score, bump the matching
/// counter, and append a usage-log row, all inside one transaction.
pub async fn reward(
    store: &Store,
    solution_id: &str,
    outcome: Outcome,
    notes: Option<String>,
) -> Result<RewardOutcome> {
    if outcome == Outcome::Skipped {
        return Err(Error::validation(
            "outcome",
            "reward only accepts success, partial, or failure",
        ));
    }

    let mut tx = store.pool().begin().await?;

    let previous_score: Option<f64> =
        sqlx::query_scalar("SELECT score FROM solutions WHERE id = ?")
            .bind(solution_id)
            .fetch_optional(&mut *tx)
            .await?;
    let previous_score =
        previous_score.ok_or_else(|| Error::not_found("solution", solution_id))? as f32;

    let new_score = apply(previous_score, outcome);

    let counter_column = match outcome {
        Outcome::Success => Some("successes"),
        Outcome::Partial => Some("partial_successes"),
        Outcome::Failure => Some("failures"),
        Outcome::Skipped => None,
    };

    if let Some(column) = counter_column {
        let sql = format!(
            "UPDATE solutions SET score = ?, {column} = {column} + 1, updated_at = ? WHERE id = ?"
        );
        sqlx::query(&sql)
            .bind(f64::from(new_score))
            .bind(chrono::Utc::now())
            .bind(solution_id)
            .execute(&mut *tx)
            .await?;
    } else {
        sqlx::query("UPDATE solutions SET score = ?, updated_at = ? WHERE id = ?")
            .bind(f64::from(new_score))
            .bind(chrono::Utc::now())
            .bind(solution_id)
            .execute(&mut *tx)
            .await?;
    }

    let repo_id: Option<String> = sqlx::query_scalar("SELECT repo_id FROM solutions WHERE id = ?")
        .bind(solution_id)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO usage_log (solution_id, repo_id, outcome, notes, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(solution_id)
    .bind(repo_id)
    .bind(outcome.to_string())
    .bind(notes)
    .bind(chrono::Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(RewardOutcome {
        previous_score,
        new_score,
    })
}

/// Fetch the current `score` and clamp per [`Solution::clamp_score`]'s
/// invariant window, used by callers that want the clamp without a full
/// [`reward`] side effect.
#[must_use]
pub fn clamp(score: f32) -> f32 {
    Solution::clamp_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::solution::NewSolution;
    use crate::memory::store_solution::store_solution;

    async fn seeded_solution(store: &Store) -> String {
        store_solution(
            store,
            NewSolution {
                problem: "p".to_string(),
                solution: "s".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn success_moves_score_from_half_to_exactly_fifty_five_hundredths() {
        let store = Store::open_in_memory().await.unwrap();
        let id = seeded_solution(&store).await;

        let result = reward(&store, &id, Outcome::Success, None).await.unwrap();
        assert!((result.previous_score - 0.5).abs() < 1e-6);
        assert!((result.new_score - 0.55).abs() < 1e-6);

        let successes: i64 = sqlx::query_scalar("SELECT successes FROM solutions WHERE id = ?")
            .bind(&id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn repeated_failures_converge_to_exactly_the_floor() {
        let store = Store::open_in_memory().await.unwrap();
        let id = seeded_solution(&store).await;

        let mut last = 0.5_f32;
        for n in 1..=4 {
            let result = reward(&store, &id, Outcome::Failure, None).await.unwrap();
            last = result.new_score;
            let expected = (0.5 - 0.15 * f32::from(n)).max(SCORE_FLOOR);
            assert!((last - expected).abs() < 1e-6);
        }
        assert!((last - SCORE_FLOOR).abs() < 1e-6);
    }

    #[tokio::test]
    async fn score_never_leaves_the_floor_ceiling_window() {
        let store = Store::open_in_memory().await.unwrap();
        let id = seeded_solution(&store).await;

        for _ in 0..50 {
            reward(&store, &id, Outcome::Success, None).await.unwrap();
        }
        let score: f64 = sqlx::query_scalar("SELECT score FROM solutions WHERE id = ?")
            .bind(&id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert!((score as f32) <= SCORE_CEILING);

        for _ in 0..50 {
            reward(&store, &id, Outcome::Failure, None).await.unwrap();
        }
        let score: f64 = sqlx::query_scalar("SELECT score FROM solutions WHERE id = ?")
            .bind(&id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert!((score as f32) >= SCORE_FLOOR);
    }

    #[tokio::test]
    async fn reward_appends_a_usage_log_row() {
        let store = Store::open_in_memory().await.unwrap();
        let id = seeded_solution(&store).await;
        reward(&store, &id, Outcome::Partial, Some("noted".to_string()))
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usage_log WHERE solution_id = ?")
            .bind(&id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn reward_unknown_solution_is_not_found() {
        let store = Store::open_in_memory().await.unwrap();
        let err = reward(&store, "sol_missing", Outcome::Success, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
