//! `export`: JSON and CSV snapshots of stored solutions, failures, and
//! repos (§6). JSON always excludes vector blobs; CSV is per-entity-type
//! only — never a combined "all" export.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::failure::{ErrorType, Failure};
use crate::domain::repo::Repo;
use crate::domain::solution::{Category, Scope, Solution};
use crate::store::vector;
use crate::{Result, Store};

/// Stamped into every JSON export's `version` field.
pub const EXPORT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Which entity type a CSV export covers. CSV has no combined "all" mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    Solutions,
    Failures,
    Repos,
}

/// `{ solutions[], failures[], repos[], exportedAt, version }`, vector
/// blobs excluded.
#[derive(Debug, Serialize)]
pub struct JsonExport {
    pub solutions: Vec<SolutionExport>,
    pub failures: Vec<FailureExport>,
    pub repos: Vec<RepoExport>,
    #[serde(rename = "exportedAt")]
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

/// [`Solution`] without its `problem_embedding` vector blob.
#[derive(Debug, Serialize)]
pub struct SolutionExport {
    pub id: String,
    pub repo_id: Option<String>,
    pub problem: String,
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

impl From<Solution> for SolutionExport {
    fn from(s: Solution) -> Self {
        Self {
            id: s.id,
            repo_id: s.repo_id,
            problem: s.problem,
            solution: s.solution,
            scope: s.scope,
            tags: s.tags,
            context: s.context,
            score: s.score,
            uses: s.uses,
            successes: s.successes,
            partial_successes: s.partial_successes,
            failures: s.failures,
            category: s.category,
            complexity: s.complexity,
            prerequisites: s.prerequisites,
            anti_patterns: s.anti_patterns,
            code_blocks: s.code_blocks,
            related_solutions: s.related_solutions,
            supersedes: s.supersedes,
            created_at: s.created_at,
            updated_at: s.updated_at,
            last_used_at: s.last_used_at,
            promoted_to_skill: s.promoted_to_skill,
        }
    }
}

/// [`Failure`] without its `error_embedding` vector blob.
#[derive(Debug, Serialize)]
pub struct FailureExport {
    pub id: String,
    pub repo_id: Option<String>,
    pub error_type: ErrorType,
    pub error_message: String,
    pub error_signature: String,
    pub stack_trace: Option<String>,
    pub files: Vec<String>,
    pub root_cause: Option<String>,
    pub fix_applied: Option<String>,
    pub prevention: Option<String>,
    pub occurrences: i64,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Failure> for FailureExport {
    fn from(f: Failure) -> Self {
        Self {
            id: f.id,
            repo_id: f.repo_id,
            error_type: f.error_type,
            error_message: f.error_message,
            error_signature: f.error_signature,
            stack_trace: f.stack_trace,
            files: f.files,
            root_cause: f.root_cause,
            fix_applied: f.fix_applied,
            prevention: f.prevention,
            occurrences: f.occurrences,
            created_at: f.created_at,
            resolved_at: f.resolved_at,
        }
    }
}

/// [`Repo`] without its `fingerprint_embedding` vector blob.
#[derive(Debug, Serialize)]
pub struct RepoExport {
    pub id: String,
    pub name: String,
    pub path: String,
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub dependencies: Vec<String>,
    pub patterns: Vec<String>,
    pub test_framework: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Repo> for RepoExport {
    fn from(r: Repo) -> Self {
        Self {
            id: r.id,
            name: r.name,
            path: r.path,
            languages: r.languages,
            frameworks: r.frameworks,
            dependencies: r.dependencies,
            patterns: r.patterns,
            test_framework: r.test_framework,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SolutionRow {
    id: String,
    repo_id: Option<String>,
    problem: String,
    problem_embedding: Vec<u8>,
    solution: String,
    scope: String,
    tags: String,
    context: String,
    score: f64,
    uses: i64,
    successes: i64,
    partial_successes: i64,
    failures: i64,
    category: Option<String>,
    complexity: Option<i64>,
    prerequisites: String,
    anti_patterns: String,
    code_blocks: String,
    related_solutions: String,
    supersedes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
    promoted_to_skill: Option<String>,
}

impl SolutionRow {
    fn into_solution(self) -> Result<Solution> {
        Ok(Solution {
            id: self.id,
            repo_id: self.repo_id,
            problem: self.problem,
            problem_embedding: vector::decode(&self.problem_embedding)
                .ok_or_else(|| crate::error::Error::SchemaMismatch("corrupt problem_embedding blob".to_string()))?,
            solution: self.solution,
            scope: self.scope.parse()?,
            tags: serde_json::from_str(&self.tags)?,
            context: serde_json::from_str(&self.context)?,
            score: self.score as f32,
            uses: self.uses,
            successes: self.successes,
            partial_successes: self.partial_successes,
            failures: self.failures,
            category: self.category.map(|c| c.parse()).transpose()?,
            complexity: self.complexity,
            prerequisites: serde_json::from_str(&self.prerequisites)?,
            anti_patterns: serde_json::from_str(&self.anti_patterns)?,
            code_blocks: serde_json::from_str(&self.code_blocks)?,
            related_solutions: serde_json::from_str(&self.related_solutions)?,
            supersedes: self.supersedes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_used_at: self.last_used_at,
            promoted_to_skill: self.promoted_to_skill,
        })
    }
}

async fn fetch_all_solutions(store: &Store) -> Result<Vec<Solution>> {
    let rows = sqlx::query_as::<_, SolutionRow>(
        "SELECT id, repo_id, problem, problem_embedding, solution, scope, tags, context,
                score, uses, successes, partial_successes, failures, category, complexity,
                prerequisites, anti_patterns, code_blocks, related_solutions, supersedes,
                created_at, updated_at, last_used_at, promoted_to_skill
         FROM solutions ORDER BY created_at ASC",
    )
    .fetch_all(store.pool())
    .await?;
    rows.into_iter().map(SolutionRow::into_solution).collect()
}

#[derive(sqlx::FromRow)]
struct FailureRow {
    id: String,
    repo_id: Option<String>,
    error_type: String,
    error_message: String,
    error_signature: String,
    error_embedding: Vec<u8>,
    stack_trace: Option<String>,
    files: String,
    root_cause: Option<String>,
    fix_applied: Option<String>,
    prevention: Option<String>,
    occurrences: i64,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl FailureRow {
    fn into_failure(self) -> Result<Failure> {
        Ok(Failure {
            id: self.id,
            repo_id: self.repo_id,
            error_type: self.error_type.parse()?,
            error_message: self.error_message,
            error_signature: self.error_signature,
            error_embedding: vector::decode(&self.error_embedding)
                .ok_or_else(|| crate::error::Error::SchemaMismatch("corrupt error_embedding blob".to_string()))?,
            stack_trace: self.stack_trace,
            files: serde_json::from_str(&self.files)?,
            root_cause: self.root_cause,
            fix_applied: self.fix_applied,
            prevention: self.prevention,
            occurrences: self.occurrences,
            created_at: self.created_at,
            resolved_at: self.resolved_at,
        })
    }
}

async fn fetch_all_failures(store: &Store) -> Result<Vec<Failure>> {
    let rows = sqlx::query_as::<_, FailureRow>(
        "SELECT id, repo_id, error_type, error_message, error_signature, error_embedding,
                stack_trace, files, root_cause, fix_applied, prevention, occurrences,
                created_at, resolved_at
         FROM failures ORDER BY created_at ASC",
    )
    .fetch_all(store.pool())
    .await?;
    rows.into_iter().map(FailureRow::into_failure).collect()
}

#[derive(sqlx::FromRow)]
struct RepoRow {
    id: String,
    name: String,
    path: String,
    languages: String,
    frameworks: String,
    dependencies: String,
    patterns: String,
    test_framework: Option<String>,
    fingerprint_embedding: Option<Vec<u8>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RepoRow {
    fn into_repo(self) -> Result<Repo> {
        Ok(Repo {
            id: self.id,
            name: self.name,
            path: self.path,
            languages: serde_json::from_str(&self.languages)?,
            frameworks: serde_json::from_str(&self.frameworks)?,
            dependencies: serde_json::from_str(&self.dependencies)?,
            patterns: serde_json::from_str(&self.patterns)?,
            test_framework: self.test_framework,
            fingerprint_embedding: self.fingerprint_embedding.and_then(|b| vector::decode(&b)),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

async fn fetch_all_repos(store: &Store) -> Result<Vec<Repo>> {
    let rows = sqlx::query_as::<_, RepoRow>(
        "SELECT id, name, path, languages, frameworks, dependencies, patterns, test_framework,
                fingerprint_embedding, created_at, updated_at
         FROM repos ORDER BY created_at ASC",
    )
    .fetch_all(store.pool())
    .await?;
    rows.into_iter().map(RepoRow::into_repo).collect()
}

/// The full JSON export: every solution, failure, and repo, vector blobs
/// excluded.
pub async fn export_json(store: &Store) -> Result<JsonExport> {
    let solutions = fetch_all_solutions(store).await?;
    let failures = fetch_all_failures(store).await?;
    let repos = fetch_all_repos(store).await?;
    Ok(JsonExport {
        solutions: solutions.into_iter().map(Into::into).collect(),
        failures: failures.into_iter().map(Into::into).collect(),
        repos: repos.into_iter().map(Into::into).collect(),
        exported_at: Utc::now(),
        version: EXPORT_VERSION.to_string(),
    })
}

/// Escape one CSV cell: quote it, doubling any embedded quotes, whenever it
/// contains a comma, quote, or newline.
fn csv_escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn csv_row(cells: &[String]) -> String {
    cells.iter().map(|c| csv_escape(c)).collect::<Vec<_>>().join(",")
}

/// One header row plus escaped cells for `export_type`. Per §6, CSV export
/// is per-entity-type only — there is no "all" mode.
pub async fn export_csv(store: &Store, export_type: ExportType) -> Result<String> {
    let mut lines = Vec::new();
    match export_type {
        ExportType::Solutions => {
            lines.push(csv_row(&[
                "id".into(), "repo_id".into(), "problem".into(), "solution".into(),
                "scope".into(), "tags".into(), "score".into(), "uses".into(),
                "successes".into(), "failures".into(), "category".into(), "created_at".into(),
            ]));
            for s in fetch_all_solutions(store).await? {
                lines.push(csv_row(&[
                    s.id,
                    s.repo_id.unwrap_or_default(),
                    s.problem,
                    s.solution,
                    s.scope.to_string(),
                    s.tags.join(";"),
                    s.score.to_string(),
                    s.uses.to_string(),
                    s.successes.to_string(),
                    s.failures.to_string(),
                    s.category.map(|c| c.to_string()).unwrap_or_default(),
                    s.created_at.to_rfc3339(),
                ]));
            }
        }
        ExportType::Failures => {
            lines.push(csv_row(&[
                "id".into(), "repo_id".into(), "error_type".into(), "error_message".into(),
                "error_signature".into(), "occurrences".into(), "root_cause".into(),
                "fix_applied".into(), "created_at".into(),
            ]));
            for f in fetch_all_failures(store).await? {
                lines.push(csv_row(&[
                    f.id,
                    f.repo_id.unwrap_or_default(),
                    f.error_type.to_string(),
                    f.error_message,
                    f.error_signature,
                    f.occurrences.to_string(),
                    f.root_cause.unwrap_or_default(),
                    f.fix_applied.unwrap_or_default(),
                    f.created_at.to_rfc3339(),
                ]));
            }
        }
        ExportType::Repos => {
            lines.push(csv_row(&[
                "id".into(), "name".into(), "path".into(), "languages".into(),
                "frameworks".into(), "test_framework".into(), "created_at".into(),
            ]));
            for r in fetch_all_repos(store).await? {
                lines.push(csv_row(&[
                    r.id,
                    r.name,
                    r.path,
                    r.languages.join(";"),
                    r.frameworks.join(";"),
                    r.test_framework.unwrap_or_default(),
                    r.created_at.to_rfc3339(),
                ]));
            }
        }
    }
    lines.push(String::new());
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_escape_quotes_cells_with_commas() {
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("has \"quote\""), "\"has \"\"quote\"\"\"");
    }

    #[tokio::test]
    async fn json_export_excludes_vector_blobs_and_counts_everything() {
        let store = Store::open_in_memory().await.unwrap();
        crate::memory::store_solution(
            &store,
            crate::domain::solution::NewSolution {
                problem: "leak".to_string(),
                solution: "close the handle".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let export = export_json(&store).await.unwrap();
        assert_eq!(export.solutions.len(), 1);
        assert!(export.failures.is_empty());
        assert!(export.repos.is_empty());
        assert_eq!(export.version, EXPORT_VERSION);

        let serialized = serde_json::to_string(&export).unwrap();
        assert!(!serialized.contains("problem_embedding"));
    }

    #[tokio::test]
    async fn csv_export_emits_header_plus_one_row_per_solution() {
        let store = Store::open_in_memory().await.unwrap();
        crate::memory::store_solution(
            &store,
            crate::domain::solution::NewSolution {
                problem: "p1".to_string(),
                solution: "s1".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let csv = export_csv(&store, ExportType::Solutions).await.unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id,repo_id"));
        assert!(lines[1].contains("p1"));
    }
}
