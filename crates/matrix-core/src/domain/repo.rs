//! [`Repo`]: a fingerprinted, indexable project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository known to Matrix, described by its fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repo {
    pub id: String,
    pub name: String,
    pub path: String,
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub dependencies: Vec<String>,
    pub patterns: Vec<String>,
    pub test_framework: Option<String>,
    /// `None` until the fingerprinter has embedded the repo at least once.
    pub fingerprint_embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
