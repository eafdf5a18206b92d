//! Test: runs fail when lookups do not return what the workload expects

use crate::helpers::*;
use prefix_trees::execution::{EngineError, ExecutionEvent, SchedulingStrategy};

#[tokio::test]
async fn test_wrong_value_fails_every_backend() {
    let yaml = r#"
name: "Test: wrong value"
operations:
  - op: insert
    key: "k"
    value: 1
  - op: find
    key: "k"
    expect: 2
"#;

    let result = run_yaml(yaml, SchedulingStrategy::Parallel).await;

    assert_run_failed(&result);
    assert!(matches!(
        result.outcome,
        Err(EngineError::ExpectationsFailed {
            backends: 4,
            failures: 4
        })
    ));
    assert_eq!(result.run.state.failed_backends, 4);
    assert_eq!(
        count_events(&result, |e| matches!(e, ExecutionEvent::ExpectationFailed { .. })),
        4
    );
    // Backends still agree on the contents
    assert_eq!(
        count_events(&result, |e| matches!(e, ExecutionEvent::Inconsistent { .. })),
        0
    );
}

#[tokio::test]
async fn test_deleted_key_expected_present() {
    let yaml = r#"
name: "Test: expected after delete"
structures: [radix, btree]
operations:
  - op: insert
    key: "gone"
    value: 5
  - op: delete
    key: "gone"
  - op: find
    key: "gone"
    expect: 5
  - op: find
    key: "gone"
"#;

    let result = run_yaml(yaml, SchedulingStrategy::Sequential).await;

    assert_run_failed(&result);
    for stats in &result.run.results {
        assert_eq!(stats.expectation_failures, 1, "{}", stats.kind);
        assert_eq!(stats.misses, 2);
    }

    let failure = result
        .events
        .iter()
        .find_map(|e| match e {
            ExecutionEvent::ExpectationFailed { failure, .. } => Some(failure.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(failure.index, 2);
    assert_eq!(failure.actual, None);
}
