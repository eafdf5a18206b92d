//! Test utility functions for workload runs

use prefix_trees::core::{Run, RunStatus, WorkloadConfig};
use prefix_trees::execution::{EngineError, ExecutionEngine, ExecutionEvent, SchedulingStrategy};
use prefix_trees::tree::TreeKind;
use std::sync::{Arc, Mutex};

/// Everything observed while running one workload
pub struct TestResult {
    pub run: Run,
    pub outcome: Result<(), EngineError>,
    pub events: Vec<ExecutionEvent>,
}

/// Parse a workload and run it, recording every event
pub async fn run_yaml(yaml: &str, strategy: SchedulingStrategy) -> TestResult {
    let config = WorkloadConfig::from_yaml(yaml).unwrap();
    run_config(&config, strategy).await
}

pub async fn run_config(config: &WorkloadConfig, strategy: SchedulingStrategy) -> TestResult {
    let mut run = Run::new(config.to_workload());
    let engine = ExecutionEngine::new(strategy);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine
        .add_event_handler(move |event| sink.lock().unwrap().push(event))
        .await;

    let outcome = engine.execute(&mut run).await;
    let events = events.lock().unwrap().clone();
    TestResult { run, outcome, events }
}

pub fn assert_run_completed(result: &TestResult) {
    if let Err(e) = &result.outcome {
        panic!("run failed: {}", e);
    }
    assert_eq!(result.run.state.status, RunStatus::Completed);
    assert_eq!(result.run.state.failed_backends, 0);
}

pub fn assert_run_failed(result: &TestResult) {
    assert!(result.outcome.is_err(), "run should have failed");
    assert_eq!(result.run.state.status, RunStatus::Failed);
}

/// Every backend counted the same hits, misses and final length
pub fn assert_backends_agree(result: &TestResult) {
    let first = &result.run.results[0];
    for stats in &result.run.results[1..] {
        assert_eq!(stats.hits, first.hits, "{} hits", stats.kind);
        assert_eq!(stats.misses, first.misses, "{} misses", stats.kind);
        assert_eq!(stats.removed, first.removed, "{} removed", stats.kind);
        assert_eq!(stats.replaced, first.replaced, "{} replaced", stats.kind);
        assert_eq!(stats.final_len, first.final_len, "{} final_len", stats.kind);
    }
}

/// Backends in the order they reported completion
pub fn completion_order(result: &TestResult) -> Vec<TreeKind> {
    result
        .events
        .iter()
        .filter_map(|event| match event {
            ExecutionEvent::BackendCompleted { stats } => Some(stats.kind),
            _ => None,
        })
        .collect()
}

pub fn count_events<F>(result: &TestResult, predicate: F) -> usize
where
    F: Fn(&ExecutionEvent) -> bool,
{
    result.events.iter().filter(|event| predicate(event)).count()
}
