//! Test: seeded random workloads

use crate::helpers::*;
use prefix_trees::core::WorkloadConfig;
use prefix_trees::execution::SchedulingStrategy;

#[tokio::test]
async fn test_random_workload_all_backends_agree() {
    let yaml = r#"
name: "Test: random"
seed: 1234
generate:
  inserts: 2000
  key_length: 10
  finds: 800
  deletes: 600
"#;

    let result = run_yaml(yaml, SchedulingStrategy::Parallel).await;

    assert_run_completed(&result);
    assert_backends_agree(&result);
    let stats = &result.run.results[0];
    assert_eq!(stats.inserts, 2000);
    assert_eq!(stats.finds, 800 + 600);
    assert_eq!(stats.removed, 600);
    assert_eq!(stats.final_len, 2000 - stats.replaced - 600);
}

/// Two-character keys collide often, so inserts replace values
#[tokio::test]
async fn test_colliding_keys() {
    let yaml = r#"
name: "Test: collisions"
seed: 5
generate:
  inserts: 4000
  key_length: 2
  finds: 1000
  deletes: 300
"#;

    let result = run_yaml(yaml, SchedulingStrategy::LimitedParallel(2)).await;

    assert_run_completed(&result);
    assert_backends_agree(&result);
    let stats = &result.run.results[0];
    assert!(stats.replaced > 0);
    assert_eq!(stats.misses, 300);
}

#[tokio::test]
async fn test_same_seed_same_workload() {
    let yaml = r#"
name: "Test: seeded"
seed: 99
generate:
  inserts: 100
  finds: 10
"#;
    let first = WorkloadConfig::from_yaml(yaml).unwrap().to_workload();
    let second = WorkloadConfig::from_yaml(yaml).unwrap().to_workload();
    assert_eq!(first.operations, second.operations);
}
