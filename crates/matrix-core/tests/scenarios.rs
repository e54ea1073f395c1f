//! End-to-end seed scenarios (S1-S6): each test exercises the public API
//! across at least two modules, the way a real caller would.

use matrix_core::domain::{
    execution::ExecutionStatus, failure::ErrorType, failure::NewFailure, solution::NewSolution,
    solution::Scope, task::Task, usage_log::Outcome,
};
use matrix_core::memory::{recall, reward, store_solution, BoostTag, RecallQuery};
use matrix_core::scheduler::{self, task_store};
use matrix_core::Store;

async fn store_with(text: &str) -> (Store, std::path::PathBuf) {
    let store = Store::open_in_memory().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker"), text).unwrap();
    (store, dir.path().to_path_buf())
}

#[tokio::test]
async fn s1_store_recall_reward() {
    let (store, cwd) = store_with("s1").await;

    let saved = store_solution(
        &store,
        NewSolution {
            problem: "OAuth refresh token rotation".to_string(),
            solution: "Use refresh_token grant with client_assertion".to_string(),
            scope: Some(Scope::Global),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let results = recall(
        &store,
        &cwd,
        RecallQuery {
            query: "oauth refresh".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let hit = results.iter().find(|r| r.id == saved.id).expect("solution should be recalled");
    assert!(hit.similarity >= 0.3, "similarity {} below threshold", hit.similarity);
    assert_eq!(hit.uses, 1, "recall should have bumped uses to 1");

    let outcome = reward(&store, &saved.id, Outcome::Success, None).await.unwrap();
    assert!((outcome.previous_score - 0.5).abs() < 1e-6);
    assert!((outcome.new_score - 0.55).abs() < 1e-6);
}

#[tokio::test]
async fn s2_context_boost_ranks_same_repo_first() {
    let store = Store::open_in_memory().await.unwrap();
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    let repo_a = matrix_core::fingerprint::detect_and_save(&store, dir_a.path()).await.unwrap();
    let repo_b = matrix_core::fingerprint::detect_and_save(&store, dir_b.path()).await.unwrap();
    assert_ne!(repo_a.id, repo_b.id);

    let sol_a = store_solution(
        &store,
        NewSolution {
            repo_id: Some(repo_a.id.clone()),
            problem: "flaky integration test retries".to_string(),
            solution: "add a retry wrapper around the network call".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    store_solution(
        &store,
        NewSolution {
            repo_id: Some(repo_b.id.clone()),
            problem: "flaky integration test retries".to_string(),
            solution: "add a retry wrapper around the network call".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let results = recall(
        &store,
        dir_a.path(),
        RecallQuery {
            query: "flaky integration test retries".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(results[0].id, sol_a.id, "same-repo solution should rank first");
    assert_eq!(results[0].boost_tag, Some(BoostTag::SameRepo));
}

#[tokio::test]
async fn s3_failure_collapse_by_signature() {
    let (store, _cwd) = store_with("s3").await;

    let first = matrix_core::memory::record_failure(
        &store,
        NewFailure {
            error_type: Some(ErrorType::Runtime),
            error_message: "Error at line 42 in '/tmp/a.ts'".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let second = matrix_core::memory::record_failure(
        &store,
        NewFailure {
            error_type: Some(ErrorType::Runtime),
            error_message: "Error at line 99 in '/tmp/b.ts'".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(first.id, second.id, "both failures should collapse into one row");
    assert_eq!(second.occurrences, 2);
    assert_eq!(first.error_signature, second.error_signature);
}

#[tokio::test]
async fn s4_incremental_indexer_replaces_symbol_on_edit() {
    let store = Store::open_in_memory().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let repo = matrix_core::fingerprint::detect_and_save(&store, dir.path()).await.unwrap();

    let src_dir = dir.path().join("src");
    std::fs::create_dir_all(&src_dir).unwrap();
    let file = src_dir.join("index.js");
    std::fs::write(&file, "function foo() {}\n").unwrap();

    let report = matrix_core::index::index_repo(
        &store,
        &repo.id,
        dir.path(),
        matrix_core::index::IndexOptions::default(),
        |_| {},
    )
    .await
    .unwrap();
    assert_eq!(report.added, 1);

    let defs = matrix_core::index::find_definitions(&store, &repo.id, "foo", None, None)
        .await
        .unwrap();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].symbol.kind, matrix_core::domain::code::SymbolKind::Function);
    assert!(!defs[0].symbol.exported);

    // mtime alone is the staleness signal; sleep past filesystem mtime
    // resolution (some filesystems only track whole seconds) before
    // rewriting so the indexer sees a newer timestamp.
    std::thread::sleep(std::time::Duration::from_millis(1100));
    std::fs::write(&file, "export function foo() {}\n").unwrap();

    let report = matrix_core::index::index_repo(
        &store,
        &repo.id,
        dir.path(),
        matrix_core::index::IndexOptions::default(),
        |_| {},
    )
    .await
    .unwrap();
    assert_eq!(report.modified, 1);
    assert_eq!(report.added, 0);

    let defs = matrix_core::index::find_definitions(&store, &repo.id, "foo", None, None)
        .await
        .unwrap();
    assert_eq!(defs.len(), 1, "the stale symbol should be replaced, not duplicated");
    assert!(defs[0].symbol.exported);
}

#[tokio::test]
async fn s5_scheduler_rollback_on_invalid_cron() {
    let (store, _cwd) = store_with("s5").await;
    let log_dir = tempfile::tempdir().unwrap();

    let before = task_store::list(&store, None).await.unwrap().len();

    let err = scheduler::add(
        &store,
        matrix_core::domain::task::NewTask {
            name: "bad schedule".to_string(),
            schedule: "not a cron expression".to_string(),
            command: "echo hi".to_string(),
            working_directory: ".".to_string(),
            timeout: None,
            env: Default::default(),
            worktree: None,
            tags: Vec::new(),
            repo_id: None,
            timezone: None,
        },
        log_dir.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, matrix_core::Error::Validation(_)));
    let after = task_store::list(&store, None).await.unwrap().len();
    assert_eq!(before, after, "a rejected schedule must not leave a row behind");
}

#[tokio::test]
async fn s6_scheduler_timeout_kills_the_child_and_records_timeout_status() {
    let (store, _cwd) = store_with("s6").await;
    let now = chrono::Utc::now();

    let task = Task {
        id: matrix_core::domain::ids::generate("task"),
        name: "slow task".to_string(),
        cron_expression: "0 0 * * * *".to_string(),
        timezone: "local".to_string(),
        command: "sleep 10".to_string(),
        working_directory: ".".to_string(),
        timeout: 1,
        env: Default::default(),
        enabled: true,
        worktree: None,
        tags: Vec::new(),
        repo_id: None,
        created_at: now,
        updated_at: now,
    };
    task_store::insert(&store, &task).await.unwrap();

    let execution = scheduler::run(&store, &task.id).await.unwrap();

    assert_eq!(execution.status, ExecutionStatus::Timeout);
    let duration = execution.duration_ms.expect("a timed-out execution still records a duration");
    assert!(
        (900..2500).contains(&duration),
        "duration_ms {duration} should be close to the 1s timeout"
    );
    assert!(execution
        .error
        .as_deref()
        .is_some_and(|e| e.to_lowercase().contains("timeout")));
}
