//! §4.10: the query API exposed over the store once files are indexed.

use chrono::{DateTime, Utc};

use crate::domain::code::{Import, Symbol, SymbolKind};
use crate::{Result, Store};

/// A symbol alongside the path of the file that defines it, for query
/// results that need to show "where" without a second round trip.
#[derive(Debug, Clone)]
pub struct SymbolLocation {
    pub symbol: Symbol,
    pub file_path: String,
}

/// `find_definitions(repo_id, name, kind?, file?)`, ordered by
/// `exported DESC, file ASC`.
pub async fn find_definitions(
    store: &Store,
    repo_id: &str,
    name: &str,
    kind: Option<SymbolKind>,
    file: Option<&str>,
) -> Result<Vec<SymbolLocation>> {
    let mut sql = String::from(
        "SELECT s.id, s.repo_id, s.file_id, s.name, s.kind, s.line, s.column, s.end_line,
                s.exported, s.is_default, s.scope, s.signature, f.file_path
         FROM symbols s JOIN repo_files f ON s.file_id = f.id
         WHERE s.repo_id = ? AND s.name = ?",
    );
    if kind.is_some() {
        sql.push_str(" AND s.kind = ?");
    }
    if file.is_some() {
        sql.push_str(" AND f.file_path = ?");
    }
    sql.push_str(" ORDER BY s.exported DESC, f.file_path ASC");

    run_symbol_location_query(store, &sql, repo_id, Some(name), kind, file).await
}

/// `list_exports(repo_id, path_prefix?)`: every exported symbol, ordered by
/// file then line.
pub async fn list_exports(
    store: &Store,
    repo_id: &str,
    path_prefix: Option<&str>,
) -> Result<Vec<SymbolLocation>> {
    let mut sql = String::from(
        "SELECT s.id, s.repo_id, s.file_id, s.name, s.kind, s.line, s.column, s.end_line,
                s.exported, s.is_default, s.scope, s.signature, f.file_path
         FROM symbols s JOIN repo_files f ON s.file_id = f.id
         WHERE s.repo_id = ? AND s.exported = 1",
    );
    if path_prefix.is_some() {
        sql.push_str(" AND f.file_path LIKE ? || '%'");
    }
    sql.push_str(" ORDER BY f.file_path ASC, s.line ASC");

    let mut q = sqlx::query_as::<_, SymbolLocationRow>(&sql).bind(repo_id);
    if let Some(prefix) = path_prefix {
        q = q.bind(prefix);
    }
    let rows = q.fetch_all(store.pool()).await?;
    rows.into_iter().map(SymbolLocationRow::into_location).collect()
}

/// `search_symbols(repo_id, q, limit)`: substring match on name, ranked
/// exact-name first, then `exported DESC`, then shortest name.
pub async fn search_symbols(
    store: &Store,
    repo_id: &str,
    q: &str,
    limit: i64,
) -> Result<Vec<SymbolLocation>> {
    let pattern = format!("%{q}%");
    let rows = sqlx::query_as::<_, SymbolLocationRow>(
        "SELECT s.id, s.repo_id, s.file_id, s.name, s.kind, s.line, s.column, s.end_line,
                s.exported, s.is_default, s.scope, s.signature, f.file_path
         FROM symbols s JOIN repo_files f ON s.file_id = f.id
         WHERE s.repo_id = ? AND s.name LIKE ?
         ORDER BY (s.name = ?) DESC, s.exported DESC, LENGTH(s.name) ASC
         LIMIT ?",
    )
    .bind(repo_id)
    .bind(&pattern)
    .bind(q)
    .bind(limit)
    .fetch_all(store.pool())
    .await?;
    rows.into_iter().map(SymbolLocationRow::into_location).collect()
}

/// `get_file_imports(repo_id, file_path)`: imports in file order.
pub async fn get_file_imports(store: &Store, repo_id: &str, file_path: &str) -> Result<Vec<Import>> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i64,
        file_id: i64,
        imported_name: String,
        local_name: Option<String>,
        source_path: String,
        is_default: bool,
        is_namespace: bool,
        is_type: bool,
        line: i64,
    }

    let rows = sqlx::query_as::<_, Row>(
        "SELECT i.id, i.file_id, i.imported_name, i.local_name, i.source_path,
                i.is_default, i.is_namespace, i.is_type, i.line
         FROM imports i
         JOIN repo_files f ON i.file_id = f.id
         WHERE f.repo_id = ? AND f.file_path = ?
         ORDER BY i.line ASC",
    )
    .bind(repo_id)
    .bind(file_path)
    .fetch_all(store.pool())
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Import {
            id: r.id,
            file_id: r.file_id,
            imported_name: r.imported_name,
            local_name: r.local_name,
            source_path: r.source_path,
            is_default: r.is_default,
            is_namespace: r.is_namespace,
            is_type: r.is_type,
            line: r.line,
        })
        .collect())
}

/// Counts and freshness for `get_index_status(repo_id)`.
#[derive(Debug, Clone, Copy)]
pub struct IndexStatus {
    pub files: i64,
    pub symbols: i64,
    pub imports: i64,
    pub last_indexed_at: Option<DateTime<Utc>>,
}

pub async fn get_index_status(store: &Store, repo_id: &str) -> Result<IndexStatus> {
    let files: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM repo_files WHERE repo_id = ?")
        .bind(repo_id)
        .fetch_one(store.pool())
        .await?;
    let symbols: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM symbols WHERE repo_id = ?")
        .bind(repo_id)
        .fetch_one(store.pool())
        .await?;
    let imports: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM imports i JOIN repo_files f ON i.file_id = f.id WHERE f.repo_id = ?",
    )
    .bind(repo_id)
    .fetch_one(store.pool())
    .await?;
    let last_indexed_at: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT MAX(indexed_at) FROM repo_files WHERE repo_id = ?")
            .bind(repo_id)
            .fetch_one(store.pool())
            .await?;

    Ok(IndexStatus {
        files,
        symbols,
        imports,
        last_indexed_at,
    })
}

/// One dead-code finding: an exported symbol with no recorded caller, or a
/// file nobody imports.
#[derive(Debug, Clone)]
pub enum DeadCodeFinding {
    UnreferencedExport { symbol: Symbol, file_path: String },
    UnreferencedFile { file_path: String },
}

/// The filename with its directory and extension stripped, e.g.
/// `src/utils/math.ts` -> `math`. Used to correlate a file against the
/// relative import paths (`./math`, `../utils/math.js`) that name it.
fn file_stem(file_path: &str) -> &str {
    std::path::Path::new(file_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_path)
}

/// `analyze_dead_code(repo_id, …)`. "Caller" is approximated by matching
/// `imported_name` against exported symbol names within the same repo —
/// this is a name-based heuristic, not full cross-file resolution.
pub async fn analyze_dead_code(
    store: &Store,
    repo_id: &str,
    include_unreferenced_files: bool,
) -> Result<Vec<DeadCodeFinding>> {
    let rows = sqlx::query_as::<_, SymbolLocationRow>(
        "SELECT s.id, s.repo_id, s.file_id, s.name, s.kind, s.line, s.column, s.end_line,
                s.exported, s.is_default, s.scope, s.signature, f.file_path
         FROM symbols s JOIN repo_files f ON s.file_id = f.id
         WHERE s.repo_id = ? AND s.exported = 1
           AND NOT EXISTS (
               SELECT 1 FROM imports i
               JOIN repo_files f2 ON i.file_id = f2.id
               WHERE f2.repo_id = s.repo_id AND i.imported_name = s.name
           )
         ORDER BY f.file_path ASC, s.line ASC",
    )
    .bind(repo_id)
    .fetch_all(store.pool())
    .await?;

    let mut findings = Vec::new();
    for row in rows {
        let location = row.into_location()?;
        findings.push(DeadCodeFinding::UnreferencedExport {
            symbol: location.symbol,
            file_path: location.file_path,
        });
    }

    if include_unreferenced_files {
        let files: Vec<String> = sqlx::query_scalar(
            "SELECT file_path FROM repo_files WHERE repo_id = ? ORDER BY file_path ASC",
        )
        .bind(repo_id)
        .fetch_all(store.pool())
        .await?;
        let source_paths: Vec<String> = sqlx::query_scalar(
            "SELECT i.source_path FROM imports i
             JOIN repo_files f ON i.file_id = f.id
             WHERE f.repo_id = ?",
        )
        .bind(repo_id)
        .fetch_all(store.pool())
        .await?;

        findings.extend(
            files
                .into_iter()
                .filter(|file_path| {
                    let stem = file_stem(file_path);
                    !source_paths.iter().any(|source| source.contains(stem))
                })
                .map(|file_path| DeadCodeFinding::UnreferencedFile { file_path }),
        );
    }

    Ok(findings)
}

#[derive(sqlx::FromRow)]
struct SymbolLocationRow {
    id: i64,
    repo_id: String,
    file_id: i64,
    name: String,
    kind: String,
    line: i64,
    column: i64,
    end_line: Option<i64>,
    exported: bool,
    is_default: bool,
    scope: Option<String>,
    signature: Option<String>,
    file_path: String,
}

impl SymbolLocationRow {
    fn into_location(self) -> Result<SymbolLocation> {
        Ok(SymbolLocation {
            symbol: Symbol {
                id: self.id,
                repo_id: self.repo_id,
                file_id: self.file_id,
                name: self.name,
                kind: self.kind.parse()?,
                line: self.line,
                column: self.column,
                end_line: self.end_line,
                exported: self.exported,
                is_default: self.is_default,
                scope: self.scope,
                signature: self.signature,
            },
            file_path: self.file_path,
        })
    }
}

async fn run_symbol_location_query(
    store: &Store,
    sql: &str,
    repo_id: &str,
    name: Option<&str>,
    kind: Option<SymbolKind>,
    file: Option<&str>,
) -> Result<Vec<SymbolLocation>> {
    let mut q = sqlx::query_as::<_, SymbolLocationRow>(sql).bind(repo_id);
    if let Some(name) = name {
        q = q.bind(name);
    }
    if let Some(kind) = kind {
        q = q.bind(kind.to_string());
    }
    if let Some(file) = file {
        q = q.bind(file);
    }
    let rows = q.fetch_all(store.pool()).await?;
    rows.into_iter().map(SymbolLocationRow::into_location).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{self, IndexOptions};

    async fn indexed_store() -> (Store, String) {
        let store = Store::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO repos (id, name, path) VALUES ('repo_1', 'demo', '/tmp/demo')")
            .execute(store.pool())
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("lib.rs"),
            "pub fn greet() -> String { \"hi\".to_string() }\nfn helper() {}\n",
        )
        .unwrap();
        index::index_repo(&store, "repo_1", dir.path(), IndexOptions::default(), |_| {})
            .await
            .unwrap();
        (store, dir.path().to_string_lossy().to_string())
    }

    #[tokio::test]
    async fn find_definitions_finds_exported_symbol() {
        let (store, _dir) = indexed_store().await;
        let found = find_definitions(&store, "repo_1", "greet", None, None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].symbol.exported);
    }

    #[tokio::test]
    async fn list_exports_excludes_private_helper() {
        let (store, _dir) = indexed_store().await;
        let exported = list_exports(&store, "repo_1", None).await.unwrap();
        assert!(exported.iter().all(|s| s.symbol.exported));
        assert!(exported.iter().any(|s| s.symbol.name == "greet"));
    }

    #[tokio::test]
    async fn get_index_status_reports_counts() {
        let (store, _dir) = indexed_store().await;
        let status = get_index_status(&store, "repo_1").await.unwrap();
        assert_eq!(status.files, 1);
        assert_eq!(status.symbols, 2);
        assert!(status.last_indexed_at.is_some());
    }

    #[tokio::test]
    async fn analyze_dead_code_flags_only_the_file_nobody_imports() {
        let store = Store::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO repos (id, name, path) VALUES ('repo_1', 'demo', '/tmp/demo')")
            .execute(store.pool())
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("math.js"), "export function add() {}\n").unwrap();
        std::fs::write(
            dir.path().join("main.js"),
            "import { add } from './math';\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("orphan.js"), "export function unused() {}\n").unwrap();

        index::index_repo(&store, "repo_1", dir.path(), IndexOptions::default(), |_| {})
            .await
            .unwrap();

        let findings = analyze_dead_code(&store, "repo_1", true).await.unwrap();
        let unreferenced_files: Vec<&str> = findings
            .iter()
            .filter_map(|f| match f {
                DeadCodeFinding::UnreferencedFile { file_path } => Some(file_path.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(unreferenced_files, vec!["main.js", "orphan.js"]);
        assert!(!unreferenced_files.contains(&"math.js"));
    }
}
