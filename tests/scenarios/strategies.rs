//! Test: scheduling strategies change ordering, never results

use crate::helpers::*;
use prefix_trees::execution::{ExecutionEvent, SchedulingStrategy};
use prefix_trees::tree::TreeKind;

const YAML: &str = r#"
name: "Test: strategies"
seed: 3
operations:
  - op: insert
    key: "seed"
    value: 1
generate:
  inserts: 500
  key_length: 6
  finds: 200
  deletes: 100
"#;

#[tokio::test]
async fn test_sequential_runs_in_workload_order() {
    let result = run_yaml(YAML, SchedulingStrategy::Sequential).await;

    assert_run_completed(&result);
    assert_eq!(completion_order(&result), TreeKind::all());

    // Each backend starts only after the previous one completed
    let mut running = 0;
    for event in &result.events {
        match event {
            ExecutionEvent::BackendStarted { .. } => {
                running += 1;
                assert_eq!(running, 1);
            }
            ExecutionEvent::BackendCompleted { .. } => running -= 1,
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_limited_parallel_caps_batches() {
    let result = run_yaml(YAML, SchedulingStrategy::LimitedParallel(3)).await;

    assert_run_completed(&result);
    let mut running = 0;
    let mut peak = 0;
    for event in &result.events {
        match event {
            ExecutionEvent::BackendStarted { .. } => {
                running += 1;
                peak = peak.max(running);
            }
            ExecutionEvent::BackendCompleted { .. } => running -= 1,
            _ => {}
        }
    }
    assert_eq!(peak, 3);
}

#[tokio::test]
async fn test_every_strategy_gives_same_stats() {
    let mut baseline = None;
    for strategy in [
        SchedulingStrategy::Sequential,
        SchedulingStrategy::Parallel,
        SchedulingStrategy::LimitedParallel(2),
    ] {
        let result = run_yaml(YAML, strategy).await;
        assert_run_completed(&result);
        assert_backends_agree(&result);

        let counts: Vec<(TreeKind, usize, usize, usize)> = TreeKind::all()
            .into_iter()
            .map(|kind| {
                let stats = result.run.result(kind).unwrap();
                (kind, stats.hits, stats.removed, stats.final_len)
            })
            .collect();
        match &baseline {
            None => baseline = Some(counts),
            Some(expected) => assert_eq!(&counts, expected, "{:?}", strategy),
        }
    }
}
