//! [`Task`]: a repeating scheduled command.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Worktree isolation options for a task run (boundary concern, carried
/// through as an opaque blob rather than interpreted by the core).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorktreeOptions {
    pub enabled: bool,
    pub base_branch: Option<String>,
}

/// A scheduled, repeating command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub cron_expression: String,
    pub timezone: String,
    pub command: String,
    pub working_directory: String,
    pub timeout: i64,
    pub env: HashMap<String, String>,
    pub enabled: bool,
    pub worktree: Option<WorktreeOptions>,
    pub tags: Vec<String>,
    pub repo_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Default task timeout, in seconds (§3 data model).
pub const DEFAULT_TIMEOUT_SECS: i64 = 300;

/// Payload accepted by [`crate::scheduler::add`].
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub schedule: String,
    pub command: String,
    pub working_directory: String,
    pub timeout: Option<i64>,
    pub env: HashMap<String, String>,
    pub worktree: Option<WorktreeOptions>,
    pub tags: Vec<String>,
    pub repo_id: Option<String>,
    pub timezone: Option<String>,
}
