//! CRUD against the `tasks` table (§4.11 "list, remove, history, logs").

use chrono::Utc;

use crate::domain::task::{Task, WorktreeOptions};
use crate::{Result, Store};

#[derive(sqlx::FromRow)]
struct Row {
    id: String,
    name: String,
    cron_expression: String,
    timezone: String,
    command: String,
    working_directory: String,
    timeout: i64,
    env: String,
    enabled: bool,
    worktree: Option<String>,
    tags: String,
    repo_id: Option<String>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl Row {
    fn into_task(self) -> Result<Task> {
        Ok(Task {
            id: self.id,
            name: self.name,
            cron_expression: self.cron_expression,
            timezone: self.timezone,
            command: self.command,
            working_directory: self.working_directory,
            timeout: self.timeout,
            env: serde_json::from_str(&self.env)?,
            enabled: self.enabled,
            worktree: self
                .worktree
                .map(|w| serde_json::from_str::<WorktreeOptions>(&w))
                .transpose()?,
            tags: serde_json::from_str(&self.tags)?,
            repo_id: self.repo_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insert `task` as-is (the caller has already validated and lowered its
/// cron expression).
pub async fn insert(store: &Store, task: &Task) -> Result<()> {
    sqlx::query(
        "INSERT INTO tasks (id, name, cron_expression, timezone, command, working_directory,
                             timeout, env, enabled, worktree, tags, repo_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&task.id)
    .bind(&task.name)
    .bind(&task.cron_expression)
    .bind(&task.timezone)
    .bind(&task.command)
    .bind(&task.working_directory)
    .bind(task.timeout)
    .bind(serde_json::to_string(&task.env)?)
    .bind(task.enabled)
    .bind(task.worktree.as_ref().map(serde_json::to_string).transpose()?)
    .bind(serde_json::to_string(&task.tags)?)
    .bind(&task.repo_id)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(store.pool())
    .await?;
    Ok(())
}

/// Delete a task row by id. Used both by normal removal and by the
/// compensating rollback after a failed platform registration (§8.8).
pub async fn delete(store: &Store, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(store.pool())
        .await?;
    Ok(())
}

pub async fn get(store: &Store, id: &str) -> Result<Task> {
    let row = sqlx::query_as::<_, Row>(
        "SELECT id, name, cron_expression, timezone, command, working_directory, timeout,
                env, enabled, worktree, tags, repo_id, created_at, updated_at
         FROM tasks WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(store.pool())
    .await?
    .ok_or_else(|| crate::error::Error::not_found("task", id))?;
    row.into_task()
}

pub async fn list(store: &Store, repo_id: Option<&str>) -> Result<Vec<Task>> {
    let rows = if let Some(repo_id) = repo_id {
        sqlx::query_as::<_, Row>(
            "SELECT id, name, cron_expression, timezone, command, working_directory, timeout,
                    env, enabled, worktree, tags, repo_id, created_at, updated_at
             FROM tasks WHERE repo_id = ? ORDER BY created_at ASC",
        )
        .bind(repo_id)
        .fetch_all(store.pool())
        .await?
    } else {
        sqlx::query_as::<_, Row>(
            "SELECT id, name, cron_expression, timezone, command, working_directory, timeout,
                    env, enabled, worktree, tags, repo_id, created_at, updated_at
             FROM tasks ORDER BY created_at ASC",
        )
        .fetch_all(store.pool())
        .await?
    };
    rows.into_iter().map(Row::into_task).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_task() -> Task {
        let now = Utc::now();
        Task {
            id: "task_1".to_string(),
            name: "nightly build".to_string(),
            cron_expression: "0 0 0 * * *".to_string(),
            timezone: "local".to_string(),
            command: "echo hi".to_string(),
            working_directory: "/tmp".to_string(),
            timeout: 300,
            env: HashMap::new(),
            enabled: true,
            worktree: None,
            tags: vec!["ci".to_string()],
            repo_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn round_trips_a_task() {
        let store = Store::open_in_memory().await.unwrap();
        insert(&store, &sample_task()).await.unwrap();
        let fetched = get(&store, "task_1").await.unwrap();
        assert_eq!(fetched.name, "nightly build");
        assert_eq!(fetched.tags, vec!["ci".to_string()]);
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let store = Store::open_in_memory().await.unwrap();
        insert(&store, &sample_task()).await.unwrap();
        delete(&store, "task_1").await.unwrap();
        assert!(get(&store, "task_1").await.is_err());
    }

    #[tokio::test]
    async fn list_orders_by_created_at() {
        let store = Store::open_in_memory().await.unwrap();
        insert(&store, &sample_task()).await.unwrap();
        let tasks = list(&store, None).await.unwrap();
        assert_eq!(tasks.len(), 1);
    }
}
