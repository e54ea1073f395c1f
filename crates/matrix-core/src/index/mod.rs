//! The code indexer (§4.8–§4.10): scan, diff, parse, write.

pub mod grammar_cache;
pub mod languages;
pub mod parser;
pub mod query;
pub mod scan;

use std::collections::HashMap;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{Result, Store};
use scan::{ScanDiff, ScanOptions, ScannedFile};

pub use query::{
    analyze_dead_code, find_definitions, get_file_imports, get_index_status, list_exports,
    search_symbols, DeadCodeFinding, IndexStatus, SymbolLocation,
};

/// Options accepted by [`index_repo`] (§4.8).
#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    pub include_tests: bool,
    pub max_file_bytes: u64,
    /// Re-parse every file regardless of stored `mtime`.
    pub force_full_rebuild: bool,
    /// Compute a content hash and use it to skip files whose mtime moved
    /// but whose content didn't (§4.8 "Incremental key").
    pub use_hash_tiebreak: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            include_tests: false,
            max_file_bytes: scan::DEFAULT_MAX_FILE_BYTES,
            force_full_rebuild: false,
            use_hash_tiebreak: false,
        }
    }
}

/// Tally of what [`index_repo`] did, for the caller's summary output.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub added: usize,
    pub modified: usize,
    pub touched_only: usize,
    pub deleted: usize,
    pub errors: Vec<(String, String)>,
}

struct FileOutcome {
    file: ScannedFile,
    hash: Option<String>,
    parsed: parser::ParseResult,
}

/// Run the full scan→diff→parse→write pipeline for `repo_id` rooted at
/// `root`. `on_progress` is called once per file as it finishes (§4.8
/// "Concurrency").
pub async fn index_repo(
    store: &Store,
    repo_id: &str,
    root: &Path,
    options: IndexOptions,
    mut on_progress: impl FnMut(&Path),
) -> Result<IndexReport> {
    let extensions = languages::all_extensions();
    let scanned = scan::scan(
        root,
        &extensions,
        ScanOptions {
            include_tests: options.include_tests,
            max_file_bytes: options.max_file_bytes,
        },
    );

    let known = load_known_files(store, repo_id).await?;
    let known_mtimes: HashMap<String, i64> = known
        .iter()
        .map(|(path, (mtime, _))| (path.clone(), *mtime))
        .collect();

    let ScanDiff {
        mut added,
        mut modified,
        deleted,
    } = if options.force_full_rebuild {
        ScanDiff {
            added: scanned.clone(),
            modified: Vec::new(),
            deleted: known_mtimes
                .keys()
                .filter(|k| !scanned.iter().any(|s| &s.path.to_string_lossy().to_string() == *k))
                .cloned()
                .collect(),
        }
    } else {
        scan::diff(&scanned, &known_mtimes)
    };

    let mut report = IndexReport::default();

    // Hash tie-break: a "modified" file whose content hash matches the
    // stored hash is downgraded to a metadata-only mtime refresh.
    let mut touched_only = Vec::new();
    if options.use_hash_tiebreak {
        let mut still_modified = Vec::new();
        for file in modified.drain(..) {
            let path_key = file.path.to_string_lossy().to_string();
            let stored_hash = known.get(&path_key).and_then(|(_, h)| h.clone());
            match (stored_hash, read_and_hash(&file.path)) {
                (Some(stored), Some(current)) if stored == current => {
                    touched_only.push((file, current));
                }
                _ => still_modified.push(file),
            }
        }
        modified = still_modified;
    }

    for (file, hash) in &touched_only {
        touch_mtime(store, repo_id, file, hash).await?;
        report.touched_only += 1;
        on_progress(&file.path);
    }

    let to_parse: Vec<ScannedFile> = added.drain(..).chain(modified.drain(..)).collect();
    let outcomes = parse_fan_out(&to_parse, options.use_hash_tiebreak).await;

    for outcome in outcomes {
        let is_new = !known_mtimes.contains_key(&outcome.file.path.to_string_lossy().to_string());
        match write_file_result(store, repo_id, &outcome).await {
            Ok(()) => {
                if is_new {
                    report.added += 1;
                } else {
                    report.modified += 1;
                }
                if let Some(err) = &outcome.parsed.error {
                    warn!(file = %outcome.file.path.display(), error = %err, "parser error, partial result kept");
                    report.errors.push((outcome.file.path.display().to_string(), err.clone()));
                }
            }
            Err(err) => {
                report.errors.push((outcome.file.path.display().to_string(), err.to_string()));
            }
        }
        on_progress(&outcome.file.path);
    }

    for path in &deleted {
        sqlx::query("DELETE FROM repo_files WHERE repo_id = ? AND file_path = ?")
            .bind(repo_id)
            .bind(path)
            .execute(store.pool())
            .await?;
        report.deleted += 1;
    }

    debug!(
        repo_id,
        added = report.added,
        modified = report.modified,
        deleted = report.deleted,
        "index run complete"
    );

    Ok(report)
}

async fn load_known_files(
    store: &Store,
    repo_id: &str,
) -> Result<HashMap<String, (i64, Option<String>)>> {
    #[derive(sqlx::FromRow)]
    struct Row {
        file_path: String,
        mtime: i64,
        hash: Option<String>,
    }

    let rows = sqlx::query_as::<_, Row>("SELECT file_path, mtime, hash FROM repo_files WHERE repo_id = ?")
        .bind(repo_id)
        .fetch_all(store.pool())
        .await?;

    Ok(rows.into_iter().map(|r| (r.file_path, (r.mtime, r.hash))).collect())
}

fn read_and_hash(path: &Path) -> Option<String> {
    let content = std::fs::read(path).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Some(hex::encode(hasher.finalize()))
}

async fn touch_mtime(store: &Store, repo_id: &str, file: &ScannedFile, hash: &str) -> Result<()> {
    let path = file.path.to_string_lossy().to_string();
    sqlx::query(
        "UPDATE repo_files SET mtime = ?, hash = ?, indexed_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
         WHERE repo_id = ? AND file_path = ?",
    )
    .bind(file.mtime_ms)
    .bind(hash)
    .bind(repo_id)
    .bind(&path)
    .execute(store.pool())
    .await?;
    Ok(())
}

/// Parse every file in `files` across a bounded worker pool. Parsing is
/// CPU-bound, so each unit of work runs on a blocking thread; all database
/// writes happen afterward, back on the caller's task, serialized through
/// the store (§4.8 "Concurrency").
async fn parse_fan_out(files: &[ScannedFile], compute_hash: bool) -> Vec<FileOutcome> {
    let mut set = tokio::task::JoinSet::new();
    for file in files {
        let file = file.clone();
        set.spawn_blocking(move || {
            let content = std::fs::read_to_string(&file.path);
            let hash = if compute_hash { read_and_hash(&file.path) } else { None };
            match content {
                Ok(content) => {
                    let extension = file
                        .path
                        .extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or_default();
                    let parsed = match languages::parser_for(extension) {
                        Some(parser) => parser.parse(&content),
                        None => parser::ParseResult {
                            error: Some(format!("no parser registered for extension '{extension}'")),
                            ..Default::default()
                        },
                    };
                    FileOutcome { file, hash, parsed }
                }
                Err(err) => FileOutcome {
                    file,
                    hash,
                    parsed: parser::ParseResult {
                        error: Some(format!("read failed: {err}")),
                        ..Default::default()
                    },
                },
            }
        });
    }

    let mut outcomes = Vec::with_capacity(files.len());
    while let Some(joined) = set.join_next().await {
        if let Ok(outcome) = joined {
            outcomes.push(outcome);
        }
    }
    outcomes
}

/// One transaction: upsert `repo_files`, clear and reinsert `symbols`/`imports`.
async fn write_file_result(store: &Store, repo_id: &str, outcome: &FileOutcome) -> Result<()> {
    let path = outcome.file.path.to_string_lossy().to_string();
    let mut tx = store.pool().begin().await?;

    sqlx::query(
        "INSERT INTO repo_files (repo_id, file_path, mtime, hash, indexed_at)
         VALUES (?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
         ON CONFLICT(repo_id, file_path) DO UPDATE SET
             mtime = excluded.mtime, hash = excluded.hash, indexed_at = excluded.indexed_at",
    )
    .bind(repo_id)
    .bind(&path)
    .bind(outcome.file.mtime_ms)
    .bind(&outcome.hash)
    .execute(&mut *tx)
    .await?;

    let file_id: i64 = sqlx::query_scalar("SELECT id FROM repo_files WHERE repo_id = ? AND file_path = ?")
        .bind(repo_id)
        .bind(&path)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM symbols WHERE file_id = ?")
        .bind(file_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM imports WHERE file_id = ?")
        .bind(file_id)
        .execute(&mut *tx)
        .await?;

    for symbol in &outcome.parsed.symbols {
        sqlx::query(
            "INSERT INTO symbols (repo_id, file_id, name, kind, line, column, end_line,
                                  exported, is_default, scope, signature)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(repo_id)
        .bind(file_id)
        .bind(&symbol.name)
        .bind(symbol.kind.to_string())
        .bind(symbol.line)
        .bind(symbol.column)
        .bind(symbol.end_line)
        .bind(symbol.exported)
        .bind(symbol.is_default)
        .bind(&symbol.scope)
        .bind(&symbol.signature)
        .execute(&mut *tx)
        .await?;
    }

    for import in &outcome.parsed.imports {
        sqlx::query(
            "INSERT INTO imports (file_id, imported_name, local_name, source_path,
                                   is_default, is_namespace, is_type, line)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(file_id)
        .bind(&import.imported_name)
        .bind(&import.local_name)
        .bind(&import.source_path)
        .bind(import.is_default)
        .bind(import.is_namespace)
        .bind(import.is_type)
        .bind(import.line)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
