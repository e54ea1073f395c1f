//! [`Execution`]: one observed run of a [`super::task::Task`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Success,
    Failure,
    Timeout,
    Skipped,
}

impl ExecutionStatus {
    /// Terminal statuses require `completed_at` to be set (§3 invariant).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
            Self::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ExecutionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "timeout" => Ok(Self::Timeout),
            "skipped" => Ok(Self::Skipped),
            other => Err(Error::validation(
                "execution status",
                format!("unknown status '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggeredBy {
    Schedule,
    Manual,
}

impl fmt::Display for TriggeredBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Schedule => "schedule",
            Self::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TriggeredBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "schedule" => Ok(Self::Schedule),
            "manual" => Ok(Self::Manual),
            other => Err(Error::validation(
                "triggered_by",
                format!("unknown value '{other}'"),
            )),
        }
    }
}

/// Maximum bytes of output captured per execution preview (§3).
pub const OUTPUT_PREVIEW_LIMIT: usize = 500;

/// One observed run of a scheduled or manually-invoked task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    pub task_id: String,
    pub task_name: String,
    pub project_path: String,
    pub cron_expression: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ExecutionStatus,
    pub triggered_by: TriggeredBy,
    pub duration_ms: Option<i64>,
    pub exit_code: Option<i64>,
    pub output_preview: Option<String>,
    pub error: Option<String>,
}

/// Truncate `text` to [`OUTPUT_PREVIEW_LIMIT`] bytes on a char boundary.
#[must_use]
pub fn truncate_preview(text: &str) -> String {
    if text.len() <= OUTPUT_PREVIEW_LIMIT {
        return text.to_string();
    }
    let mut end = OUTPUT_PREVIEW_LIMIT;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Success.is_terminal());
        assert!(ExecutionStatus::Timeout.is_terminal());
    }

    #[test]
    fn truncate_preview_respects_limit() {
        let long = "x".repeat(1000);
        let truncated = truncate_preview(&long);
        assert_eq!(truncated.len(), OUTPUT_PREVIEW_LIMIT);
    }

    #[test]
    fn truncate_preview_is_noop_under_limit() {
        assert_eq!(truncate_preview("short"), "short");
    }
}
