//! Repo fingerprinting: detect languages, frameworks, dependencies, and
//! patterns for a working directory, embed the result, and persist it to
//! the `repos` row (§4.6).

pub mod frameworks;
pub mod manifests;

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::domain::repo::Repo;
use crate::embedding;
use crate::store::Store;

/// A structured description of a repository, prior to embedding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint {
    pub name: Option<String>,
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub dependencies: Vec<String>,
    pub patterns: Vec<String>,
    pub test_framework: Option<String>,
}

/// Walk upward from `dir` to find the enclosing git work tree, falling back
/// to `dir` itself when it isn't inside a git repository.
#[must_use]
pub fn find_project_root(dir: &Path) -> PathBuf {
    git2::Repository::discover(dir)
        .ok()
        .and_then(|repo| repo.workdir().map(Path::to_path_buf))
        .unwrap_or_else(|| dir.to_path_buf())
}

/// Read every recognized project descriptor at `root` and merge them into a
/// single [`Fingerprint`].
#[must_use]
pub fn build(root: &Path) -> Fingerprint {
    let found = [
        manifests::read_cargo_toml(root),
        manifests::read_package_json(root),
        manifests::read_python_project(root),
        manifests::read_go_mod(root),
    ];

    let mut fingerprint = Fingerprint::default();
    let mut is_workspace = false;
    for info in found.into_iter().flatten() {
        fingerprint.languages.push(info.language.to_string());
        fingerprint.dependencies.extend(info.dependencies);
        if fingerprint.name.is_none() {
            fingerprint.name = info.name;
        }
        if fingerprint.test_framework.is_none() {
            fingerprint.test_framework = info.test_framework;
        }
        is_workspace |= info.is_workspace;
    }

    fingerprint.dependencies.sort();
    fingerprint.dependencies.dedup();
    fingerprint.languages.sort();
    fingerprint.languages.dedup();
    fingerprint.frameworks = frameworks::detect_frameworks(&fingerprint.dependencies);
    fingerprint.patterns = frameworks::detect_patterns(root, is_workspace, &fingerprint.dependencies);

    if fingerprint.name.is_none() {
        fingerprint.name = root.file_name().map(|n| n.to_string_lossy().into_owned());
    }

    fingerprint
}

/// Render a fingerprint into the text form that gets embedded, dropping any
/// empty section.
#[must_use]
pub fn text_form(fp: &Fingerprint) -> String {
    let mut parts = Vec::new();
    if let Some(name) = &fp.name {
        parts.push(format!("project: {name}"));
    }
    if !fp.languages.is_empty() {
        parts.push(format!("languages: {}", fp.languages.join(", ")));
    }
    if !fp.frameworks.is_empty() {
        parts.push(format!("frameworks: {}", fp.frameworks.join(", ")));
    }
    if !fp.patterns.is_empty() {
        parts.push(format!("patterns: {}", fp.patterns.join(", ")));
    }
    if !fp.dependencies.is_empty() {
        parts.push(format!("dependencies: {}", fp.dependencies.join(", ")));
    }
    parts.join(" | ")
}

/// The subset of a repo's state recall needs to compute context boosts.
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub id: String,
    pub fingerprint_embedding: Option<Vec<f32>>,
}

/// Fingerprint `dir`, persisting a new `repos` row or updating an existing
/// one (only if the structural fields actually changed), and return the
/// resulting row.
pub async fn detect_and_save(store: &Store, dir: &Path) -> crate::Result<Repo> {
    let root = find_project_root(dir);
    let path = root.to_string_lossy().into_owned();
    let fingerprint = build(&root);

    let existing: Option<(
        String,
        String,
        String,
        String,
        String,
        String,
        Option<String>,
    )> = sqlx::query_as(
        "SELECT id, name, languages, frameworks, dependencies, patterns, test_framework
         FROM repos WHERE path = ?",
    )
    .bind(&path)
    .fetch_optional(store.pool())
    .await?;

    let languages_json = serde_json::to_string(&fingerprint.languages)?;
    let frameworks_json = serde_json::to_string(&fingerprint.frameworks)?;
    let dependencies_json = serde_json::to_string(&fingerprint.dependencies)?;
    let patterns_json = serde_json::to_string(&fingerprint.patterns)?;

    if let Some((id, name, languages, frameworks_db, dependencies_db, patterns_db, test_fw)) =
        existing
    {
        let unchanged = name == fingerprint.name.clone().unwrap_or_default()
            && languages == languages_json
            && frameworks_db == frameworks_json
            && dependencies_db == dependencies_json
            && patterns_db == patterns_json
            && test_fw == fingerprint.test_framework;

        if unchanged {
            return load_repo(store, &id).await;
        }

        let embedding = embedding::embed(&text_form(&fingerprint));
        let blob = crate::store::vector::encode(&embedding);
        let now = Utc::now();
        sqlx::query(
            "UPDATE repos SET name = ?, languages = ?, frameworks = ?, dependencies = ?,
             patterns = ?, test_framework = ?, fingerprint_embedding = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(fingerprint.name.clone().unwrap_or_default())
        .bind(&languages_json)
        .bind(&frameworks_json)
        .bind(&dependencies_json)
        .bind(&patterns_json)
        .bind(&fingerprint.test_framework)
        .bind(blob)
        .bind(now)
        .bind(&id)
        .execute(store.pool())
        .await?;

        return load_repo(store, &id).await;
    }

    let id = crate::domain::ids::generate("repo");
    let embedding = embedding::embed(&text_form(&fingerprint));
    let blob = crate::store::vector::encode(&embedding);
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO repos (id, name, path, languages, frameworks, dependencies, patterns,
         test_framework, fingerprint_embedding, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(fingerprint.name.unwrap_or_default())
    .bind(&path)
    .bind(languages_json)
    .bind(frameworks_json)
    .bind(dependencies_json)
    .bind(patterns_json)
    .bind(fingerprint.test_framework)
    .bind(blob)
    .bind(now)
    .bind(now)
    .execute(store.pool())
    .await?;

    load_repo(store, &id).await
}

/// Look up the fingerprint context for `dir` without writing anything,
/// returning `None` if the repo hasn't been fingerprinted yet.
pub async fn lookup_context(store: &Store, dir: &Path) -> crate::Result<Option<RepoContext>> {
    let root = find_project_root(dir);
    let path = root.to_string_lossy().into_owned();

    let row: Option<(String, Option<Vec<u8>>)> =
        sqlx::query_as("SELECT id, fingerprint_embedding FROM repos WHERE path = ?")
            .bind(&path)
            .fetch_optional(store.pool())
            .await?;

    Ok(row.map(|(id, blob)| RepoContext {
        id,
        fingerprint_embedding: blob.and_then(|b| crate::store::vector::decode(&b)),
    }))
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
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

async fn load_repo(store: &Store, id: &str) -> crate::Result<Repo> {
    let row: RepoRow = sqlx::query_as(
        "SELECT id, name, path, languages, frameworks, dependencies, patterns,
         test_framework, fingerprint_embedding, created_at, updated_at
         FROM repos WHERE id = ?",
    )
    .bind(id)
    .fetch_one(store.pool())
    .await?;

    Ok(Repo {
        id: row.id,
        name: row.name,
        path: row.path,
        languages: serde_json::from_str(&row.languages)?,
        frameworks: serde_json::from_str(&row.frameworks)?,
        dependencies: serde_json::from_str(&row.dependencies)?,
        patterns: serde_json::from_str(&row.patterns)?,
        test_framework: row.test_framework,
        fingerprint_embedding: row.fingerprint_embedding.and_then(|b| crate::store::vector::decode(&b)),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
