//! §4.8 step 1: enumerate candidate files under a repo root.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use walkdir::WalkDir;

/// Default cap on a single file's size before it's skipped (§4.8).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

/// Directories never descended into regardless of language.
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    ".next",
    "vendor",
    "venv",
    ".venv",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    "coverage",
    ".cargo",
    "Pods",
    ".gradle",
    "bin",
    "obj",
    "_build",
    "deps",
    "zig-cache",
    "zig-out",
];

/// Path fragments that mark a file as a test or mock, excluded unless the
/// caller opts in (§4.8 step 1).
const TEST_MARKERS: &[&str] = &[
    "/test/",
    "/tests/",
    "/__tests__/",
    "/__mocks__/",
    "/spec/",
    "/mocks/",
    "/fixtures/",
];

const TEST_SUFFIXES: &[&str] = &[
    ".test.",
    ".spec.",
    "_test.",
    "_spec.",
    "Test.java",
    "Tests.cs",
];

/// Generated declaration files, always skipped (§4.8 step 1).
const GENERATED_SUFFIXES: &[&str] = &[".d.ts", ".pb.go", ".generated.cs", "_pb2.py"];

/// A file the scanner considers a candidate for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Millisecond-precision modification time, the sole staleness signal.
    pub mtime_ms: i64,
}

/// Scan options (§4.8 step 1).
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub include_tests: bool,
    pub max_file_bytes: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_tests: false,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name) || name.starts_with('.') && name != "." && name != ".."
}

fn looks_like_test_path(path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    TEST_MARKERS.iter().any(|m| normalized.contains(m))
        || TEST_SUFFIXES.iter().any(|s| normalized.contains(s))
}

fn is_generated(path: &str) -> bool {
    GENERATED_SUFFIXES.iter().any(|s| path.ends_with(s))
}

/// Walk `root`, returning every file whose extension is registered in
/// `extensions` and that survives the exclusion rules.
pub fn scan(root: &Path, extensions: &[&str], options: ScanOptions) -> Vec<ScannedFile> {
    let mut out = Vec::new();

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            if e.file_type().is_dir() && e.depth() > 0 {
                let name = e.file_name().to_string_lossy();
                return !is_excluded_dir(&name);
            }
            true
        })
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            continue;
        }

        let path_str = path.to_string_lossy();
        if is_generated(&path_str) {
            continue;
        }
        if !options.include_tests && looks_like_test_path(&path_str) {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if metadata.len() > options.max_file_bytes {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let Ok(since_epoch) = modified.duration_since(UNIX_EPOCH) else {
            continue;
        };

        out.push(ScannedFile {
            path: path.to_path_buf(),
            mtime_ms: since_epoch.as_millis() as i64,
        });
    }

    out
}

/// The result of diffing a scan against the `repo_files` table (§4.8 step 2).
#[derive(Debug, Clone, Default)]
pub struct ScanDiff {
    pub added: Vec<ScannedFile>,
    pub modified: Vec<ScannedFile>,
    pub deleted: Vec<String>,
}

/// Diff `scanned` against `known` (path -> stored mtime_ms).
pub fn diff(
    scanned: &[ScannedFile],
    known: &std::collections::HashMap<String, i64>,
) -> ScanDiff {
    let mut result = ScanDiff::default();
    let mut seen = std::collections::HashSet::new();

    for file in scanned {
        let key = file.path.to_string_lossy().to_string();
        seen.insert(key.clone());
        match known.get(&key) {
            None => result.added.push(file.clone()),
            Some(&stored_mtime) if stored_mtime != file.mtime_ms => {
                result.modified.push(file.clone());
            }
            Some(_) => {}
        }
    }

    for key in known.keys() {
        if !seen.contains(key) {
            result.deleted.push(key.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn excludes_node_modules_and_test_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/ignored.ts"), "export {}").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.ts"), "export const x = 1;").unwrap();
        fs::create_dir_all(dir.path().join("src/__tests__")).unwrap();
        fs::write(dir.path().join("src/__tests__/lib.test.ts"), "test()").unwrap();

        let files = scan(dir.path(), &["ts"], ScanOptions::default());
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("src/lib.ts"));
    }

    #[test]
    fn skips_generated_declaration_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("types.d.ts"), "declare const x: number;").unwrap();
        fs::write(dir.path().join("real.ts"), "export const x = 1;").unwrap();

        let files = scan(dir.path(), &["ts"], ScanOptions::default());
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("real.ts"));
    }

    #[test]
    fn skips_files_over_the_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.rs"), "x".repeat(100)).unwrap();
        let options = ScanOptions {
            max_file_bytes: 10,
            ..Default::default()
        };
        let files = scan(dir.path(), &["rs"], options);
        assert!(files.is_empty());
    }

    #[test]
    fn include_tests_opts_back_in() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("tests")).unwrap();
        fs::write(dir.path().join("tests/foo_test.rs"), "fn t() {}").unwrap();
        let options = ScanOptions {
            include_tests: true,
            ..Default::default()
        };
        let files = scan(dir.path(), &["rs"], options);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn diff_classifies_added_modified_deleted() {
        let mut known = std::collections::HashMap::new();
        known.insert("a.rs".to_string(), 100);
        known.insert("b.rs".to_string(), 200);

        let scanned = vec![
            ScannedFile {
                path: PathBuf::from("a.rs"),
                mtime_ms: 100,
            },
            ScannedFile {
                path: PathBuf::from("b.rs"),
                mtime_ms: 999,
            },
            ScannedFile {
                path: PathBuf::from("c.rs"),
                mtime_ms: 1,
            },
        ];

        let result = diff(&scanned, &known);
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.added[0].path, PathBuf::from("c.rs"));
        assert_eq!(result.modified.len(), 1);
        assert_eq!(result.modified[0].path, PathBuf::from("b.rs"));
        assert_eq!(result.deleted, vec!["a.rs".to_string()]);
    }
}
