//! Schema revisions, applied forward-only by [`super::migrator`].
//!
//! Each entry is one transaction's worth of DDL. `SCHEMA_VERSION` is the
//! highest version number here; a fresh database and a database migrated
//! from empty through every entry in [`MIGRATIONS`] are, by construction,
//! structurally identical — they run exactly the same statements. That
//! equivalence is pinned down by
//! `migrator::tests::fresh_build_matches_stepwise_migration_structurally`.

/// Highest schema revision this binary knows how to reach.
pub const SCHEMA_VERSION: i64 = 2;

/// Ordered, forward-only schema revisions. Never edit a past entry: add a
/// new one instead, even to fix a previous migration's mistake.
pub const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_1), (2, MIGRATION_2)];

const MIGRATION_1: &str = r"
CREATE TABLE IF NOT EXISTS repos (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    path TEXT NOT NULL UNIQUE,
    languages TEXT NOT NULL DEFAULT '[]',
    frameworks TEXT NOT NULL DEFAULT '[]',
    dependencies TEXT NOT NULL DEFAULT '[]',
    patterns TEXT NOT NULL DEFAULT '[]',
    test_framework TEXT,
    fingerprint_embedding BLOB,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE TABLE IF NOT EXISTS solutions (
    id TEXT PRIMARY KEY,
    repo_id TEXT REFERENCES repos(id) ON DELETE SET NULL,
    problem TEXT NOT NULL,
    problem_embedding BLOB NOT NULL,
    solution TEXT NOT NULL,
    scope TEXT NOT NULL CHECK(scope IN ('global', 'stack', 'repo')),
    tags TEXT NOT NULL DEFAULT '[]',
    context TEXT NOT NULL DEFAULT '{}',
    score REAL NOT NULL DEFAULT 0.5 CHECK(score >= 0.1 AND score <= 1.0),
    uses INTEGER NOT NULL DEFAULT 0,
    successes INTEGER NOT NULL DEFAULT 0,
    partial_successes INTEGER NOT NULL DEFAULT 0,
    failures INTEGER NOT NULL DEFAULT 0,
    category TEXT CHECK(category IS NULL OR category IN
        ('bugfix', 'feature', 'refactor', 'config', 'pattern', 'optimization')),
    complexity INTEGER CHECK(complexity IS NULL OR (complexity >= 1 AND complexity <= 10)),
    prerequisites TEXT NOT NULL DEFAULT '[]',
    anti_patterns TEXT NOT NULL DEFAULT '[]',
    code_blocks TEXT NOT NULL DEFAULT '[]',
    related_solutions TEXT NOT NULL DEFAULT '[]',
    supersedes TEXT REFERENCES solutions(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    last_used_at TEXT,
    promoted_to_skill TEXT
);

CREATE INDEX IF NOT EXISTS idx_solutions_repo ON solutions(repo_id);
CREATE INDEX IF NOT EXISTS idx_solutions_scope ON solutions(scope);

CREATE TABLE IF NOT EXISTS failures (
    id TEXT PRIMARY KEY,
    repo_id TEXT REFERENCES repos(id) ON DELETE SET NULL,
    error_type TEXT NOT NULL CHECK(error_type IN ('runtime', 'build', 'test', 'type', 'other')),
    error_message TEXT NOT NULL,
    error_signature TEXT NOT NULL UNIQUE,
    error_embedding BLOB NOT NULL,
    stack_trace TEXT,
    files TEXT NOT NULL DEFAULT '[]',
    root_cause TEXT,
    fix_applied TEXT,
    prevention TEXT,
    occurrences INTEGER NOT NULL DEFAULT 1 CHECK(occurrences >= 1),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    resolved_at TEXT
);

CREATE TABLE IF NOT EXISTS usage_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    solution_id TEXT NOT NULL REFERENCES solutions(id) ON DELETE CASCADE,
    repo_id TEXT REFERENCES repos(id) ON DELETE SET NULL,
    outcome TEXT NOT NULL CHECK(outcome IN ('success', 'partial', 'failure', 'skipped')),
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_usage_log_solution ON usage_log(solution_id);

CREATE TABLE IF NOT EXISTS warnings (
    id TEXT PRIMARY KEY,
    type TEXT NOT NULL CHECK(type IN ('file', 'package')),
    target TEXT NOT NULL,
    ecosystem TEXT,
    reason TEXT NOT NULL,
    severity TEXT NOT NULL CHECK(severity IN ('info', 'warn', 'block')),
    repo_id TEXT REFERENCES repos(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_warnings_unique ON warnings(
    type, target, COALESCE(ecosystem, ''), COALESCE(repo_id, '')
);

CREATE TABLE IF NOT EXISTS repo_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id TEXT NOT NULL REFERENCES repos(id) ON DELETE CASCADE,
    file_path TEXT NOT NULL,
    mtime INTEGER NOT NULL,
    hash TEXT,
    indexed_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    UNIQUE(repo_id, file_path)
);

CREATE TABLE IF NOT EXISTS symbols (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id TEXT NOT NULL REFERENCES repos(id) ON DELETE CASCADE,
    file_id INTEGER NOT NULL REFERENCES repo_files(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    kind TEXT NOT NULL CHECK(kind IN
        ('function', 'class', 'interface', 'type', 'enum', 'variable', 'const',
         'method', 'property', 'namespace')),
    line INTEGER NOT NULL,
    column INTEGER NOT NULL,
    end_line INTEGER,
    exported INTEGER NOT NULL DEFAULT 0,
    is_default INTEGER NOT NULL DEFAULT 0,
    scope TEXT,
    signature TEXT
);

CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file_id);
CREATE INDEX IF NOT EXISTS idx_symbols_repo_name ON symbols(repo_id, name);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES repo_files(id) ON DELETE CASCADE,
    imported_name TEXT NOT NULL,
    local_name TEXT,
    source_path TEXT NOT NULL,
    is_default INTEGER NOT NULL DEFAULT 0,
    is_namespace INTEGER NOT NULL DEFAULT 0,
    is_type INTEGER NOT NULL DEFAULT 0,
    line INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_imports_file ON imports(file_id);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    cron_expression TEXT NOT NULL,
    timezone TEXT NOT NULL DEFAULT 'local',
    command TEXT NOT NULL,
    working_directory TEXT NOT NULL,
    timeout INTEGER NOT NULL DEFAULT 300,
    env TEXT NOT NULL DEFAULT '{}',
    enabled INTEGER NOT NULL DEFAULT 1,
    worktree TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    repo_id TEXT REFERENCES repos(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE TABLE IF NOT EXISTS executions (
    id TEXT PRIMARY KEY,
    task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    task_name TEXT NOT NULL,
    project_path TEXT NOT NULL,
    cron_expression TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    status TEXT NOT NULL CHECK(status IN ('running', 'success', 'failure', 'timeout', 'skipped')),
    triggered_by TEXT NOT NULL CHECK(triggered_by IN ('schedule', 'manual')),
    duration_ms INTEGER,
    exit_code INTEGER,
    output_preview TEXT,
    error TEXT
);

CREATE INDEX IF NOT EXISTS idx_executions_task ON executions(task_id);
";

const MIGRATION_2: &str = r"
CREATE TABLE IF NOT EXISTS api_cache (
    cache_key TEXT PRIMARY KEY,
    response TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_solutions_last_used ON solutions(last_used_at);
CREATE INDEX IF NOT EXISTS idx_failures_signature ON failures(error_signature);
";
