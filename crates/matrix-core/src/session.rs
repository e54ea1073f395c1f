//! Per-session context files under `<matrix dir>/sessions/`.
//!
//! The session id is attacker-controlled (it arrives over the hook stdin
//! event), so the filename is derived from a hash rather than the id
//! itself: `session-<hex16>.json`, where `<hex16>` is the first 16 hex
//! characters of the SHA-256 digest of the session id. This rules out path
//! traversal regardless of what the session id contains.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Error;

/// TTL for a session context file, per §6.
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Contents of a session context file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionContext {
    pub session_id: String,
    pub mode: String,
    pub started_at: DateTime<Utc>,
    pub user_name: Option<String>,
    pub repo_root: Option<String>,
    pub repo_id: Option<String>,
}

/// Map a session id to its on-disk filename: `session-<hex16>.json`.
#[must_use]
pub fn filename_for(session_id: &str) -> String {
    let digest = Sha256::digest(session_id.as_bytes());
    let hex = hex::encode(digest);
    format!("session-{}.json", &hex[..16])
}

/// Full path to a session's context file under `sessions_dir`.
#[must_use]
pub fn path_for(sessions_dir: &Path, session_id: &str) -> PathBuf {
    sessions_dir.join(filename_for(session_id))
}

/// Persist a session context file, creating `sessions_dir` if missing.
pub fn save(sessions_dir: &Path, ctx: &SessionContext) -> crate::Result<()> {
    std::fs::create_dir_all(sessions_dir)?;
    let path = path_for(sessions_dir, &ctx.session_id);
    let body = serde_json::to_vec_pretty(ctx)?;
    std::fs::write(path, body)?;
    Ok(())
}

/// Load a session context file, if present and not expired.
///
/// Returns `Ok(None)` for a missing or expired file; a malformed file is a
/// hard [`Error::SchemaMismatch`].
pub fn load(sessions_dir: &Path, session_id: &str) -> crate::Result<Option<SessionContext>> {
    let path = path_for(sessions_dir, session_id);
    if !path.exists() {
        return Ok(None);
    }
    let body = std::fs::read(&path)?;
    let ctx: SessionContext = serde_json::from_slice(&body)
        .map_err(|e| Error::SchemaMismatch(format!("corrupt session file: {e}")))?;

    let age = Utc::now().signed_duration_since(ctx.started_at);
    if age.num_seconds() > SESSION_TTL_SECS {
        return Ok(None);
    }
    Ok(Some(ctx))
}

/// Remove every session file older than [`SESSION_TTL_SECS`]. Best-effort:
/// unreadable entries are skipped rather than surfaced as errors.
pub fn reap_expired(sessions_dir: &Path) -> crate::Result<usize> {
    if !sessions_dir.exists() {
        return Ok(0);
    }
    let mut reaped = 0;
    for entry in std::fs::read_dir(sessions_dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let Ok(body) = std::fs::read(&path) else {
            continue;
        };
        let Ok(ctx) = serde_json::from_slice::<SessionContext>(&body) else {
            continue;
        };
        let age = Utc::now().signed_duration_since(ctx.started_at);
        if age.num_seconds() > SESSION_TTL_SECS && std::fs::remove_file(&path).is_ok() {
            reaped += 1;
        }
    }
    Ok(reaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(session_id: &str) -> SessionContext {
        SessionContext {
            session_id: session_id.to_string(),
            mode: "interactive".to_string(),
            started_at: Utc::now(),
            user_name: None,
            repo_root: None,
            repo_id: None,
        }
    }

    #[test]
    fn filename_is_independent_of_path_traversal_attempts() {
        let name = filename_for("../../etc/passwd");
        assert!(!name.contains(".."));
        assert!(!name.contains('/'));
        assert!(name.starts_with("session-"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn filename_is_deterministic() {
        assert_eq!(filename_for("abc"), filename_for("abc"));
        assert_ne!(filename_for("abc"), filename_for("abd"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = sample("session-123");
        save(dir.path(), &ctx).unwrap();
        let loaded = load(dir.path(), "session-123").unwrap();
        assert_eq!(loaded, Some(ctx));
    }

    #[test]
    fn load_missing_session_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load(dir.path(), "nope").unwrap(), None);
    }

    #[test]
    fn load_expired_session_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = sample("old-session");
        ctx.started_at = Utc::now() - chrono::Duration::seconds(SESSION_TTL_SECS + 60);
        save(dir.path(), &ctx).unwrap();
        assert_eq!(load(dir.path(), "old-session").unwrap(), None);
    }

    #[test]
    fn reap_expired_removes_only_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = sample("fresh");
        let mut stale = sample("stale");
        stale.started_at = Utc::now() - chrono::Duration::seconds(SESSION_TTL_SECS + 60);
        save(dir.path(), &fresh).unwrap();
        save(dir.path(), &stale).unwrap();

        let reaped = reap_expired(dir.path()).unwrap();
        assert_eq!(reaped, 1);
        assert!(path_for(dir.path(), "fresh").exists());
        assert!(!path_for(dir.path(), "stale").exists());
    }
}
