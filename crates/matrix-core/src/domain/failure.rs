//! [`Failure`]: a recorded error and its fix.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Classification of where a [`Failure`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Runtime,
    Build,
    Test,
    Type,
    Other,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Runtime => "runtime",
            Self::Build => "build",
            Self::Test => "test",
            Self::Type => "type",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ErrorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "runtime" => Ok(Self::Runtime),
            "build" => Ok(Self::Build),
            "test" => Ok(Self::Test),
            "type" => Ok(Self::Type),
            "other" => Ok(Self::Other),
            other => Err(Error::validation(
                "error_type",
                format!("unknown error type '{other}'"),
            )),
        }
    }
}

/// A recorded error and its eventual fix, keyed by a deterministic
/// signature so repeated occurrences collapse into one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub id: String,
    pub repo_id: Option<String>,
    pub error_type: ErrorType,
    pub error_message: String,
    pub error_signature: String,
    pub error_embedding: Vec<f32>,
    pub stack_trace: Option<String>,
    pub files: Vec<String>,
    pub root_cause: Option<String>,
    pub fix_applied: Option<String>,
    pub prevention: Option<String>,
    pub occurrences: i64,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Payload accepted by [`crate::memory::record_failure`].
#[derive(Debug, Clone, Default)]
pub struct NewFailure {
    pub repo_id: Option<String>,
    pub error_type: Option<ErrorType>,
    pub error_message: String,
    pub stack_trace: Option<String>,
    pub files: Vec<String>,
    pub root_cause: Option<String>,
    pub fix_applied: Option<String>,
    pub prevention: Option<String>,
}
