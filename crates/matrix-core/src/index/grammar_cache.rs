//! Models the on-disk grammar-cache contract (§6) even though every grammar
//! ships compiled into this binary rather than fetched as WASM at runtime.
//! A marker file per language records that the grammar is "installed",
//! written atomically via rename-into-place so a crash mid-write can never
//! leave a half-written marker behind.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::Result;

/// Ensure the marker file for `language` exists under `grammars_dir`,
/// writing it atomically if absent. Idempotent.
pub fn ensure_cached(grammars_dir: &Path, language: &str) -> Result<PathBuf> {
    fs::create_dir_all(grammars_dir)?;
    let marker = grammars_dir.join(format!("{language}.grammar"));
    if marker.exists() {
        return Ok(marker);
    }

    let tmp = grammars_dir.join(format!("{language}.grammar.tmp"));
    fs::write(&tmp, b"compiled-in")?;
    fs::rename(&tmp, &marker).map_err(|e| {
        Error::Fatal(format!("failed to install grammar marker for {language}: {e}"))
    })?;
    Ok(marker)
}

/// Whether `language`'s marker file is present.
#[must_use]
pub fn is_cached(grammars_dir: &Path, language: &str) -> bool {
    grammars_dir.join(format!("{language}.grammar")).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_cached_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = ensure_cached(dir.path(), "rust").unwrap();
        assert!(is_cached(dir.path(), "rust"));
        let second = ensure_cached(dir.path(), "rust").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn is_cached_false_for_unknown_language() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_cached(dir.path(), "cobol"));
    }
}
