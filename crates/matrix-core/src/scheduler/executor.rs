//! §4.11 "Execution": spawn a task's command, cap its output, enforce its
//! timeout, and record the result as one `executions` row.

use std::process::Stdio;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::domain::execution::{truncate_preview, Execution, ExecutionStatus, TriggeredBy};
use crate::domain::ids;
use crate::domain::task::Task;
use crate::{Result, Store};

/// Hard cap on bytes captured per stream (§4.11 step 3, §8.9).
pub const OUTPUT_CAP_BYTES: usize = 1024 * 1024;

struct CapturedStream {
    bytes: Vec<u8>,
    truncated: bool,
}

async fn read_capped(mut reader: impl tokio::io::AsyncRead + Unpin) -> CapturedStream {
    let mut bytes = Vec::new();
    let mut chunk = [0_u8; 8192];
    let mut truncated = false;
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if bytes.len() + n > OUTPUT_CAP_BYTES {
                    let remaining = OUTPUT_CAP_BYTES.saturating_sub(bytes.len());
                    bytes.extend_from_slice(&chunk[..remaining]);
                    truncated = true;
                    // Keep draining so the child never blocks on a full pipe,
                    // but stop accumulating.
                    let mut sink = [0_u8; 8192];
                    while reader.read(&mut sink).await.unwrap_or(0) > 0 {}
                    break;
                }
                bytes.extend_from_slice(&chunk[..n]);
            }
            Err(_) => break,
        }
    }
    CapturedStream { bytes, truncated }
}

/// Run `task`'s command to completion (or until its timeout fires),
/// recording a single `executions` row throughout.
pub async fn run_execution(store: &Store, task: &Task, triggered_by: TriggeredBy) -> Result<Execution> {
    let id = ids::generate("exec");
    let started_at = Utc::now();

    sqlx::query(
        "INSERT INTO executions (id, task_id, task_name, project_path, cron_expression,
                                  started_at, status, triggered_by)
         VALUES (?, ?, ?, ?, ?, ?, 'running', ?)",
    )
    .bind(&id)
    .bind(&task.id)
    .bind(&task.name)
    .bind(&task.working_directory)
    .bind(&task.cron_expression)
    .bind(started_at)
    .bind(triggered_by.to_string())
    .execute(store.pool())
    .await?;

    let outcome = spawn_and_wait(task).await;

    let completed_at = Utc::now();
    let duration_ms = (completed_at - started_at).num_milliseconds();

    sqlx::query(
        "UPDATE executions SET completed_at = ?, status = ?, duration_ms = ?, exit_code = ?,
                                output_preview = ?, error = ?
         WHERE id = ?",
    )
    .bind(completed_at)
    .bind(outcome.status.to_string())
    .bind(duration_ms)
    .bind(outcome.exit_code)
    .bind(&outcome.output_preview)
    .bind(&outcome.error)
    .bind(&id)
    .execute(store.pool())
    .await?;

    Ok(Execution {
        id,
        task_id: task.id.clone(),
        task_name: task.name.clone(),
        project_path: task.working_directory.clone(),
        cron_expression: task.cron_expression.clone(),
        started_at,
        completed_at: Some(completed_at),
        status: outcome.status,
        triggered_by,
        duration_ms: Some(duration_ms),
        exit_code: outcome.exit_code,
        output_preview: outcome.output_preview,
        error: outcome.error,
    })
}

struct SpawnOutcome {
    status: ExecutionStatus,
    exit_code: Option<i64>,
    output_preview: Option<String>,
    error: Option<String>,
}

/// Kill SIGKILL to the process group `pid` leads, not just `pid` itself, so
/// a backgrounded descendant (`sleep 300 &`) doesn't survive a timeout.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let _ = std::process::Command::new("kill")
        .arg("-9")
        .arg(format!("-{pid}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

async fn spawn_and_wait(task: &Task) -> SpawnOutcome {
    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(&task.command)
        .current_dir(&task.working_directory)
        .envs(&task.env)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Put the child in its own process group so a timeout can kill every
    // descendant it spawns, not just the immediate `sh -c`.
    #[cfg(unix)]
    command.process_group(0);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return SpawnOutcome {
                status: ExecutionStatus::Failure,
                exit_code: None,
                output_preview: None,
                error: Some(format!("spawn failed: {e}")),
            };
        }
    };

    let pid = child.id();
    let stdout = child.stdout.take().map(BufReader::new);
    let stderr = child.stderr.take().map(BufReader::new);

    // Read on their own tasks so the captured bytes survive a
    // `tokio::time::timeout` cancellation of the wait below; the timeout
    // future is dropped on expiry, but these keep running and pick up
    // whatever the kill-triggered EOF leaves in the pipes.
    let stdout_task = tokio::spawn(async move {
        match stdout {
            Some(r) => read_capped(r).await,
            None => CapturedStream { bytes: Vec::new(), truncated: false },
        }
    });
    let stderr_task = tokio::spawn(async move {
        match stderr {
            Some(r) => read_capped(r).await,
            None => CapturedStream { bytes: Vec::new(), truncated: false },
        }
    });

    let timeout = Duration::from_secs(task.timeout.max(0) as u64);
    let empty = || CapturedStream { bytes: Vec::new(), truncated: false };

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => {
            let stdout_captured = stdout_task.await.unwrap_or_else(|_| empty());
            let stderr_captured = stderr_task.await.unwrap_or_else(|_| empty());
            finalize(status, stdout_captured, stderr_captured, task.timeout)
        }
        Err(_) => {
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            let _ = child.start_kill();
            let _ = child.wait().await;
            let stderr_captured = stderr_task.await.unwrap_or_else(|_| empty());
            stdout_task.abort();
            let stderr_text = String::from_utf8_lossy(&stderr_captured.bytes).to_string();
            SpawnOutcome {
                status: ExecutionStatus::Timeout,
                exit_code: None,
                output_preview: Some(truncate_preview(&stderr_text)),
                error: Some(format!("Task timed out after {}s", task.timeout)),
            }
        }
    }
}

fn finalize(
    status: std::io::Result<std::process::ExitStatus>,
    stdout: CapturedStream,
    stderr: CapturedStream,
    _timeout_secs: i64,
) -> SpawnOutcome {
    let stdout_text = String::from_utf8_lossy(&stdout.bytes).to_string();
    let stderr_text = String::from_utf8_lossy(&stderr.bytes).to_string();
    let combined = format!("{stdout_text}{stderr_text}");

    match status {
        Ok(exit_status) if exit_status.success() => SpawnOutcome {
            status: ExecutionStatus::Success,
            exit_code: Some(0),
            output_preview: Some(truncate_preview(&combined)),
            error: None,
        },
        Ok(exit_status) => {
            let code = exit_status.code().map(i64::from);
            let error = if stderr_text.trim().is_empty() {
                format!("Process exited with code {}", code.unwrap_or(-1))
            } else {
                stderr_text.clone()
            };
            SpawnOutcome {
                status: ExecutionStatus::Failure,
                exit_code: code,
                output_preview: Some(truncate_preview(&combined)),
                error: Some(truncate_preview(&error)),
            }
        }
        Err(e) => SpawnOutcome {
            status: ExecutionStatus::Failure,
            exit_code: None,
            output_preview: Some(truncate_preview(&combined)),
            error: Some(format!("failed to wait for child: {e}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn task_with_command(command: &str, timeout: i64) -> Task {
        let now = Utc::now();
        Task {
            id: "task_1".to_string(),
            name: "t".to_string(),
            cron_expression: "0 0 0 * * *".to_string(),
            timezone: "local".to_string(),
            command: command.to_string(),
            working_directory: std::env::temp_dir().to_string_lossy().to_string(),
            timeout,
            env: HashMap::new(),
            enabled: true,
            worktree: None,
            tags: Vec::new(),
            repo_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn fill_and_read_capped(len: usize) -> CapturedStream {
        use tokio::io::AsyncWriteExt;
        let (mut tx, rx) = tokio::io::duplex(8192);
        let input = vec![b'x'; len];
        let writer = tokio::spawn(async move {
            let _ = tx.write_all(&input).await;
        });
        let captured = read_capped(rx).await;
        writer.await.unwrap();
        captured
    }

    #[tokio::test]
    async fn read_capped_stops_at_exactly_the_cap_and_drains_the_rest() {
        let captured = fill_and_read_capped(OUTPUT_CAP_BYTES + 4096).await;
        assert_eq!(captured.bytes.len(), OUTPUT_CAP_BYTES);
        assert!(captured.truncated);
    }

    #[tokio::test]
    async fn read_capped_leaves_output_under_the_cap_untruncated() {
        let captured = fill_and_read_capped(OUTPUT_CAP_BYTES - 1).await;
        assert_eq!(captured.bytes.len(), OUTPUT_CAP_BYTES - 1);
        assert!(!captured.truncated);
    }

    #[tokio::test]
    async fn successful_command_records_success() {
        let store = Store::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO tasks (id, name, cron_expression, command, working_directory) VALUES ('task_1','t','0 0 0 * * *','echo hi','/tmp')")
            .execute(store.pool())
            .await
            .unwrap();
        let task = task_with_command("echo hi", 5);
        let execution = run_execution(&store, &task, TriggeredBy::Manual).await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Success);
        assert_eq!(execution.exit_code, Some(0));
        assert!(execution.output_preview.unwrap().contains("hi"));
    }

    #[tokio::test]
    async fn failing_command_records_failure_with_exit_code() {
        let store = Store::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO tasks (id, name, cron_expression, command, working_directory) VALUES ('task_1','t','0 0 0 * * *','exit 7','/tmp')")
            .execute(store.pool())
            .await
            .unwrap();
        let task = task_with_command("exit 7", 5);
        let execution = run_execution(&store, &task, TriggeredBy::Manual).await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Failure);
        assert_eq!(execution.exit_code, Some(7));
    }

    #[tokio::test]
    async fn timeout_kills_the_process_and_records_timeout_status() {
        let store = Store::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO tasks (id, name, cron_expression, command, working_directory) VALUES ('task_1','t','0 0 0 * * *','sleep 10','/tmp')")
            .execute(store.pool())
            .await
            .unwrap();
        let task = task_with_command("echo going down >&2 && sleep 10", 1);
        let execution = run_execution(&store, &task, TriggeredBy::Manual).await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Timeout);
        assert!(execution.error.unwrap().contains("timed out"));
        assert!(execution.duration_ms.unwrap() < 5000);
        assert!(execution.output_preview.unwrap().contains("going down"));
    }

    #[tokio::test]
    async fn timeout_kills_a_backgrounded_descendant_too() {
        let marker = std::env::temp_dir().join(format!("matrix_pgroup_test_{}", std::process::id()));
        let _ = std::fs::remove_file(&marker);

        let store = Store::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO tasks (id, name, cron_expression, command, working_directory) VALUES ('task_1','t','0 0 0 * * *','sleep 10','/tmp')")
            .execute(store.pool())
            .await
            .unwrap();
        let command = format!("(sleep 2 && touch {}) & sleep 10", marker.display());
        let task = task_with_command(&command, 1);
        let execution = run_execution(&store, &task, TriggeredBy::Manual).await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Timeout);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists(), "backgrounded descendant survived the timeout kill");
    }
}
