//! [`Warning`]: a user-declared grudge against a file or package.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningType {
    #[default]
    File,
    Package,
}

impl fmt::Display for WarningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::File => "file",
            Self::Package => "package",
        };
        write!(f, "{s}")
    }
}

impl FromStr for WarningType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "file" => Ok(Self::File),
            "package" => Ok(Self::Package),
            other => Err(Error::validation(
                "warning type",
                format!("unknown type '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Block,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Block => "block",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "block" => Ok(Self::Block),
            other => Err(Error::validation(
                "severity",
                format!("unknown severity '{other}'"),
            )),
        }
    }
}

/// A standing grudge against a file glob or package name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub id: String,
    pub warning_type: WarningType,
    pub target: String,
    pub ecosystem: Option<String>,
    pub reason: String,
    pub severity: Severity,
    /// `None` means global (applies to every repo).
    pub repo_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
