//! §4.7: the failure engine — normalized, signature-deduplicated error
//! records with an attached fix.

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::domain::failure::{ErrorType, Failure, NewFailure};
use crate::domain::ids;
use crate::store::vector;
use crate::{embedding, Result, Store};

const MAX_NORMALIZED_LEN: usize = 500;
const SEARCH_THRESHOLD: f32 = 0.5;

/// Replace volatile substrings (numbers, quoted literals, paths, hex
/// addresses) with stable placeholders, collapse whitespace, and truncate.
/// Two messages differing only in those substrings normalize identically
/// (§8.6).
#[must_use]
pub fn normalize(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let chars: Vec<char> = message.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if c == '\'' || c == '"' {
            if let Some(end) = chars[i + 1..].iter().position(|&c2| c2 == c) {
                out.push_str("STR");
                i += end + 2;
                continue;
            }
        }

        if c == '/' || (c.is_ascii_alphabetic() && looks_like_drive_prefix(&chars, i)) {
            if let Some(len) = path_len(&chars, i) {
                out.push_str("PATH");
                i += len;
                continue;
            }
        }

        if c.is_ascii_digit() {
            // Digits are replaced with N before a hex prefix ever gets a
            // chance to match, so "0xDEAD" normalizes to "NxDEAD" rather
            // than "HEX" — matches the original tool's signature collapse.
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            out.push('N');
            i = j;
            continue;
        }

        out.push(c);
        i += 1;
    }

    let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim();
    trimmed.chars().take(MAX_NORMALIZED_LEN).collect()
}

fn looks_like_drive_prefix(chars: &[char], i: usize) -> bool {
    chars.get(i + 1) == Some(&':') && chars.get(i + 2) == Some(&'\\')
}

fn path_len(chars: &[char], start: usize) -> Option<usize> {
    let mut end = start;
    let is_path_char =
        |c: char| c.is_alphanumeric() || matches!(c, '/' | '\\' | '.' | '_' | '-' | ':');
    while end < chars.len() && is_path_char(chars[end]) {
        end += 1;
    }
    let segment: String = chars[start..end].iter().collect();
    if segment.matches('/').count() >= 1 || segment.matches('\\').count() >= 1 {
        Some(end - start)
    } else {
        None
    }
}

/// Deterministic signature for `(error_type, normalized_message)`: the
/// first 16 hex characters of a SHA-256 digest.
#[must_use]
pub fn signature(error_type: ErrorType, normalized: &str) -> String {
    let digest = Sha256::digest(format!("{error_type}:{normalized}").as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Record a failure, collapsing into an existing row if its signature
/// matches (§4.7).
pub async fn record_failure(store: &Store, input: NewFailure) -> Result<Failure> {
    let error_type = input.error_type.unwrap_or(ErrorType::Other);
    let normalized = normalize(&input.error_message);
    let sig = signature(error_type, &normalized);
    let now = Utc::now();

    let existing_id: Option<String> =
        sqlx::query_scalar("SELECT id FROM failures WHERE error_signature = ?")
            .bind(&sig)
            .fetch_optional(store.pool())
            .await?;

    if let Some(id) = existing_id {
        sqlx::query(
            "UPDATE failures SET occurrences = occurrences + 1,
             root_cause = COALESCE(?, root_cause),
             fix_applied = COALESCE(?, fix_applied),
             prevention = COALESCE(?, prevention),
             resolved_at = ?
             WHERE id = ?",
        )
        .bind(&input.root_cause)
        .bind(&input.fix_applied)
        .bind(&input.prevention)
        .bind(now)
        .bind(&id)
        .execute(store.pool())
        .await?;
        return load(store, &id).await;
    }

    let id = ids::generate("fail");
    let embedding_text = format!(
        "{error_type}: {} {}",
        input.error_message,
        input.root_cause.clone().unwrap_or_default()
    );
    let embedding = embedding::embed(&embedding_text);
    let blob = vector::encode(&embedding);
    let files = serde_json::to_string(&input.files)?;

    sqlx::query(
        "INSERT INTO failures
         (id, repo_id, error_type, error_message, error_signature, error_embedding,
          stack_trace, files, root_cause, fix_applied, prevention, occurrences, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(&id)
    .bind(&input.repo_id)
    .bind(error_type.to_string())
    .bind(&input.error_message)
    .bind(&sig)
    .bind(blob)
    .bind(&input.stack_trace)
    .bind(files)
    .bind(&input.root_cause)
    .bind(&input.fix_applied)
    .bind(&input.prevention)
    .bind(now)
    .execute(store.pool())
    .await?;

    load(store, &id).await
}

/// A row surfaced by [`search_failures`], carrying its similarity to the
/// query alongside the [`Failure`] itself.
#[derive(Debug, Clone)]
pub struct FailureMatch {
    pub failure: Failure,
    pub similarity: f32,
}

/// Embed `error_message` and return the `limit` most similar failures that
/// have a recorded `fix_applied`, with cosine similarity `>= 0.5`.
pub async fn search_failures(
    store: &Store,
    error_message: &str,
    limit: i64,
) -> Result<Vec<FailureMatch>> {
    let query_embedding = embedding::embed(error_message);

    #[derive(sqlx::FromRow)]
    struct Row {
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
        created_at: chrono::DateTime<Utc>,
        resolved_at: Option<chrono::DateTime<Utc>>,
    }

    let rows: Vec<Row> = sqlx::query_as(
        "SELECT id, repo_id, error_type, error_message, error_signature, error_embedding,
                stack_trace, files, root_cause, fix_applied, prevention, occurrences,
                created_at, resolved_at
         FROM failures WHERE fix_applied IS NOT NULL",
    )
    .fetch_all(store.pool())
    .await?;

    let mut matches = Vec::new();
    for row in rows {
        let Some(embedding) = vector::decode(&row.error_embedding) else {
            continue;
        };
        let sim = match embedding::cosine(&query_embedding, &embedding) {
            Ok(sim) => sim,
            Err(_) => continue,
        };
        if sim < SEARCH_THRESHOLD {
            continue;
        }
        let Ok(error_type) = row.error_type.parse() else {
            continue;
        };
        matches.push(FailureMatch {
            similarity: sim,
            failure: Failure {
                id: row.id,
                repo_id: row.repo_id,
                error_type,
                error_message: row.error_message,
                error_signature: row.error_signature,
                error_embedding: embedding,
                stack_trace: row.stack_trace,
                files: serde_json::from_str(&row.files)?,
                root_cause: row.root_cause,
                fix_applied: row.fix_applied,
                prevention: row.prevention,
                occurrences: row.occurrences,
                created_at: row.created_at,
                resolved_at: row.resolved_at,
            },
        });
    }

    matches.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
    matches.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
    Ok(matches)
}

async fn load(store: &Store, id: &str) -> Result<Failure> {
    #[derive(sqlx::FromRow)]
    struct Row {
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
        created_at: chrono::DateTime<Utc>,
        resolved_at: Option<chrono::DateTime<Utc>>,
    }

    let row: Row = sqlx::query_as(
        "SELECT id, repo_id, error_type, error_message, error_signature, error_embedding,
                stack_trace, files, root_cause, fix_applied, prevention, occurrences,
                created_at, resolved_at
         FROM failures WHERE id = ?",
    )
    .bind(id)
    .fetch_one(store.pool())
    .await?;

    Ok(Failure {
        id: row.id,
        repo_id: row.repo_id,
        error_type: row.error_type.parse()?,
        error_message: row.error_message,
        error_signature: row.error_signature,
        error_embedding: vector::decode(&row.error_embedding).unwrap_or_default(),
        stack_trace: row.stack_trace,
        files: serde_json::from_str(&row.files)?,
        root_cause: row.root_cause,
        fix_applied: row.fix_applied,
        prevention: row.prevention,
        occurrences: row.occurrences,
        created_at: row.created_at,
        resolved_at: row.resolved_at,
    })
}
