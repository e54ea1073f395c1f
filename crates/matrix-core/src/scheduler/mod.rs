//! The task scheduler (§4.11): cron-backed commands registered with the
//! platform scheduling facility, executed with a capped-output, timed-out
//! child process.

pub mod cron_parse;
pub mod executor;
pub mod registration;
pub mod task_store;

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::domain::execution::{Execution, TriggeredBy};
use crate::domain::ids;
use crate::domain::task::{NewTask, Task, DEFAULT_TIMEOUT_SECS};
use crate::error::Error;
use crate::{Result, Store};

pub use cron_parse::get_next_runs;

/// `add(task)` (§4.11): validate the schedule, persist the task, register
/// it with the platform facility. Registration failure deletes the
/// just-inserted row (§8.8's compensating rollback).
pub async fn add(store: &Store, input: NewTask, log_dir: &Path) -> Result<Task> {
    let cron_expression = cron_parse::parse(&input.schedule)?;
    let now = Utc::now();
    let task = Task {
        id: ids::generate("task"),
        name: input.name,
        cron_expression,
        timezone: input.timezone.unwrap_or_else(|| "local".to_string()),
        command: input.command,
        working_directory: input.working_directory,
        timeout: input.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
        env: input.env,
        enabled: true,
        worktree: input.worktree,
        tags: input.tags,
        repo_id: input.repo_id,
        created_at: now,
        updated_at: now,
    };

    task_store::insert(store, &task).await?;

    if let Err(err) = registration::register(task.clone(), log_dir.to_path_buf()).await {
        task_store::delete(store, &task.id).await?;
        return Err(err);
    }

    Ok(task)
}

/// List tasks, optionally scoped to one repo.
pub async fn list(store: &Store, repo_id: Option<&str>) -> Result<Vec<Task>> {
    task_store::list(store, repo_id).await
}

/// Remove a task: unregister it from the platform facility, then delete
/// its row.
pub async fn remove(store: &Store, task_id: &str) -> Result<()> {
    registration::unregister(task_id.to_string()).await?;
    task_store::delete(store, task_id).await
}

/// Run a task immediately, outside its schedule.
pub async fn run(store: &Store, task_id: &str) -> Result<Execution> {
    let task = task_store::get(store, task_id).await?;
    executor::run_execution(store, &task, TriggeredBy::Manual).await
}

/// Run a task as fired by its own schedule (distinguished from [`run`] only
/// by `triggered_by`).
pub async fn run_scheduled(store: &Store, task_id: &str) -> Result<Execution> {
    let task = task_store::get(store, task_id).await?;
    executor::run_execution(store, &task, TriggeredBy::Schedule).await
}

#[derive(sqlx::FromRow)]
struct ExecutionRow {
    id: String,
    task_id: String,
    task_name: String,
    project_path: String,
    cron_expression: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    status: String,
    triggered_by: String,
    duration_ms: Option<i64>,
    exit_code: Option<i64>,
    output_preview: Option<String>,
    error: Option<String>,
}

impl ExecutionRow {
    fn into_execution(self) -> Result<Execution> {
        Ok(Execution {
            id: self.id,
            task_id: self.task_id,
            task_name: self.task_name,
            project_path: self.project_path,
            cron_expression: self.cron_expression,
            started_at: self.started_at,
            completed_at: self.completed_at,
            status: self.status.parse()?,
            triggered_by: self.triggered_by.parse()?,
            duration_ms: self.duration_ms,
            exit_code: self.exit_code,
            output_preview: self.output_preview,
            error: self.error,
        })
    }
}

/// `history(task_id)`: the most recent executions, newest first.
pub async fn history(store: &Store, task_id: &str, limit: i64) -> Result<Vec<Execution>> {
    let rows = sqlx::query_as::<_, ExecutionRow>(
        "SELECT id, task_id, task_name, project_path, cron_expression, started_at, completed_at,
                status, triggered_by, duration_ms, exit_code, output_preview, error
         FROM executions WHERE task_id = ? ORDER BY started_at DESC LIMIT ?",
    )
    .bind(task_id)
    .bind(limit)
    .fetch_all(store.pool())
    .await?;
    rows.into_iter().map(ExecutionRow::into_execution).collect()
}

/// `logs(task_id)`: the raw stdout/stderr log files a registered task's
/// wrapped command appends to.
pub async fn logs(log_dir: &Path, task_id: &str) -> Result<(String, String)> {
    let out = tokio::fs::read_to_string(log_dir.join(format!("{task_id}.out.log")))
        .await
        .unwrap_or_default();
    let err = tokio::fs::read_to_string(log_dir.join(format!("{task_id}.err.log")))
        .await
        .unwrap_or_default();
    Ok((out, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn new_task(schedule: &str) -> NewTask {
        NewTask {
            name: "nightly".to_string(),
            schedule: schedule.to_string(),
            command: "echo hi".to_string(),
            working_directory: "/tmp".to_string(),
            timeout: None,
            env: HashMap::new(),
            worktree: None,
            tags: Vec::new(),
            repo_id: None,
            timezone: None,
        }
    }

    #[tokio::test]
    async fn invalid_cron_expression_leaves_no_row_behind() {
        let store = Store::open_in_memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = add(&store, new_task("not a schedule"), dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn history_orders_newest_first() {
        let store = Store::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO tasks (id, name, cron_expression, command, working_directory) VALUES ('task_1','t','0 0 0 * * *','echo hi','/tmp')")
            .execute(store.pool())
            .await
            .unwrap();
        run(&store, "task_1").await.unwrap();
        run(&store, "task_1").await.unwrap();

        let runs = history(&store, "task_1", 10).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].started_at >= runs[1].started_at);
    }
}
