//! [`Solution`]: a reusable problem -> fix pair, and its enums.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Visibility class of a [`Solution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Stack,
    Repo,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Global => "global",
            Self::Stack => "stack",
            Self::Repo => "repo",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "global" => Ok(Self::Global),
            "stack" => Ok(Self::Stack),
            "repo" => Ok(Self::Repo),
            other => Err(Error::validation("scope", format!("unknown scope '{other}'"))),
        }
    }
}

/// Classification of a [`Solution`]'s subject matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Bugfix,
    Feature,
    Refactor,
    Config,
    Pattern,
    Optimization,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bugfix => "bugfix",
            Self::Feature => "feature",
            Self::Refactor => "refactor",
            Self::Config => "config",
            Self::Pattern => "pattern",
            Self::Optimization => "optimization",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "bugfix" => Ok(Self::Bugfix),
            "feature" => Ok(Self::Feature),
            "refactor" => Ok(Self::Refactor),
            "config" => Ok(Self::Config),
            "pattern" => Ok(Self::Pattern),
            "optimization" => Ok(Self::Optimization),
            other => Err(Error::validation(
                "category",
                format!("unknown category '{other}'"),
            )),
        }
    }
}

/// A reusable problem -> fix pair, with a reward-weighted score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub id: String,
    pub repo_id: Option<String>,
    pub problem: String,
    pub problem_embedding: Vec<f32>,
    pub solution: String,
    pub scope: Scope,
    pub tags: Vec<String>,
    pub context: Value,
    pub score: f32,
    pub uses: i64,
    pub successes: i64,
    pub partial_successes: i64,
    pub failures: i64,
    pub category: Option<Category>,
    pub complexity: Option<i64>,
    pub prerequisites: Vec<String>,
    pub anti_patterns: Vec<String>,
    pub code_blocks: Vec<Value>,
    pub related_solutions: Vec<String>,
    pub supersedes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub promoted_to_skill: Option<String>,
}

impl Solution {
    /// Fraction of outcomes that were full successes, 0.5 absent any
    /// recorded outcome (per §4.3's enriched result fields).
    #[must_use]
    pub fn success_rate(&self) -> f32 {
        let total = self.successes + self.failures;
        if total == 0 {
            0.5
        } else {
            self.successes as f32 / total as f32
        }
    }

    /// Clamp `score` into the hard [0.1, 1.0] invariant window.
    #[must_use]
    pub fn clamp_score(score: f32) -> f32 {
        score.clamp(0.1, 1.0)
    }
}

/// Payload accepted by [`crate::memory::store_solution`].
#[derive(Debug, Clone, Default)]
pub struct NewSolution {
    pub repo_id: Option<String>,
    pub problem: String,
    pub solution: String,
    pub scope: Option<Scope>,
    pub tags: Vec<String>,
    pub context: Option<Value>,
    pub category: Option<Category>,
    pub complexity: Option<i64>,
    pub prerequisites: Vec<String>,
    pub anti_patterns: Vec<String>,
    pub code_blocks: Vec<Value>,
    pub related_solutions: Vec<String>,
    pub supersedes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_defaults_to_half_with_no_outcomes() {
        let now = Utc::now();
        let solution = Solution {
            id: "sol_1".to_string(),
            repo_id: None,
            problem: "problem".to_string(),
            problem_embedding: Vec::new(),
            solution: "fix".to_string(),
            scope: Scope::Global,
            tags: Vec::new(),
            context: Value::Null,
            score: 0.5,
            uses: 0,
            successes: 0,
            partial_successes: 0,
            failures: 0,
            category: None,
            complexity: None,
            prerequisites: Vec::new(),
            anti_patterns: Vec::new(),
            code_blocks: Vec::new(),
            related_solutions: Vec::new(),
            supersedes: None,
            created_at: now,
            updated_at: now,
            last_used_at: None,
            promoted_to_skill: None,
        };
        assert_eq!(solution.success_rate(), 0.5);
    }

    #[test]
    fn clamp_score_respects_floor_and_ceiling() {
        assert_eq!(Solution::clamp_score(-1.0), 0.1);
        assert_eq!(Solution::clamp_score(5.0), 1.0);
        assert_eq!(Solution::clamp_score(0.5), 0.5);
    }

    #[test]
    fn scope_round_trips_through_string() {
        for s in ["global", "stack", "repo"] {
            assert_eq!(s.parse::<Scope>().unwrap().to_string(), s);
        }
        assert!("bogus".parse::<Scope>().is_err());
    }
}
