//! End-to-end CLI tests against the built `matrix` binary. Each test
//! sandboxes `HOME` to a fresh tempdir so `directories::ProjectDirs`
//! resolves a throwaway data directory instead of the real one.

use assert_cmd::Command;
use predicates::prelude::*;

fn sandboxed_cmd(home: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_matrix"));
    cmd.env("HOME", home);
    cmd
}

#[test]
fn version_prints_the_crate_version() {
    let home = tempfile::tempdir().unwrap();
    sandboxed_cmd(home.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("matrix"));
}

#[test]
fn doctor_reports_a_healthy_fresh_store() {
    let home = tempfile::tempdir().unwrap();
    sandboxed_cmd(home.path())
        .args(["doctor", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"wal_checkpoint_busy\":false"));
}

#[test]
fn store_then_list_round_trips_a_solution() {
    let home = tempfile::tempdir().unwrap();
    sandboxed_cmd(home.path())
        .args(["store", "connection pool exhaustion", "raise max_connections"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stored sol_"));

    sandboxed_cmd(home.path())
        .args(["list", "solutions", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("connection pool exhaustion"));
}

#[test]
fn reward_on_an_unknown_id_fails_with_user_error_exit_code() {
    let home = tempfile::tempdir().unwrap();
    sandboxed_cmd(home.path())
        .args(["reward", "sol_doesnotexist", "success"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn dreamer_add_rejects_an_invalid_schedule() {
    let home = tempfile::tempdir().unwrap();
    sandboxed_cmd(home.path())
        .args(["dreamer", "add", "nightly", "not a cron expression", "echo hi"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn export_csv_without_a_type_is_a_user_error() {
    let home = tempfile::tempdir().unwrap();
    sandboxed_cmd(home.path())
        .args(["export", "--format", "csv"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn hook_with_a_malformed_event_exits_non_blocking() {
    let home = tempfile::tempdir().unwrap();
    sandboxed_cmd(home.path())
        .arg("hook")
        .write_stdin("not json")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("\"ok\":false"));
}

#[test]
fn hook_recall_event_returns_an_empty_result_set() {
    let home = tempfile::tempdir().unwrap();
    sandboxed_cmd(home.path())
        .arg("hook")
        .write_stdin(r#"{"event":"recall","payload":{"query":"anything"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ok\":true"));
}

#[test]
fn hook_session_start_then_session_context_round_trips() {
    let home = tempfile::tempdir().unwrap();
    sandboxed_cmd(home.path())
        .arg("hook")
        .write_stdin(r#"{"event":"session_start","payload":{"session_id":"abc123","mode":"interactive"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode\":\"interactive\""));

    sandboxed_cmd(home.path())
        .arg("hook")
        .write_stdin(r#"{"event":"session_context","payload":{"session_id":"abc123"}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"session_id\":\"abc123\""));
}
