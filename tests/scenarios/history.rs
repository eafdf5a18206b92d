//! Test: finished runs round-trip through the history stores

use crate::helpers::*;
use prefix_trees::core::RunStatus;
use prefix_trees::execution::SchedulingStrategy;
use prefix_trees::persistence::{
    create_summary, InMemoryPersistence, PersistenceBackend, SqliteRunStore,
};

const PASSING: &str = r#"
name: "Test: history"
operations:
  - op: insert
    key: "k"
    value: 1
  - op: find
    key: "k"
    expect: 1
"#;

const FAILING: &str = r#"
name: "Test: history"
operations:
  - op: find
    key: "k"
    expect: 1
"#;

async fn record_runs(store: &dyn PersistenceBackend) {
    for yaml in [PASSING, FAILING] {
        let result = run_yaml(yaml, SchedulingStrategy::Sequential).await;
        store.save_run(&create_summary(&result.run)).await.unwrap();
    }
}

#[tokio::test]
async fn test_history_in_memory() {
    let store = InMemoryPersistence::new();
    record_runs(&store).await;

    let runs = store.list_runs("Test: history").await.unwrap();
    assert_eq!(runs.len(), 2);
    let completed = runs.iter().filter(|r| r.status == RunStatus::Completed).count();
    let failed = runs.iter().filter(|r| r.status == RunStatus::Failed).count();
    assert_eq!((completed, failed), (1, 1));
}

#[tokio::test]
async fn test_history_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.db");
    let store = SqliteRunStore::new(&path).await.unwrap();
    record_runs(&store).await;

    assert_eq!(store.list_workloads().await.unwrap(), vec!["Test: history"]);
    let runs = store.list_runs("Test: history").await.unwrap();
    assert_eq!(runs.len(), 2);

    let failed = runs.iter().find(|r| r.status == RunStatus::Failed).unwrap();
    assert_eq!(failed.backends.len(), 4);
    assert!(failed.backends.iter().all(|stats| stats.expectation_failures == 1));

    let loaded = store.load_run(failed.run_id).await.unwrap().unwrap();
    assert_eq!(loaded.operations, 1);
    assert_eq!(loaded.progress, 1.0);
}
