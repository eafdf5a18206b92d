//! Main execution engine - replays a workload on every scheduled backend

use crate::{
    core::{BackendStats, Operation, Run, RunStatus},
    execution::{BackendOutcome, ExpectationFailure, OperationExecutor, SchedulingStrategy},
    tree::TreeKind,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        workload_name: String,
        backends: usize,
        operations: usize,
    },
    BackendStarted {
        kind: TreeKind,
    },
    ExpectationFailed {
        kind: TreeKind,
        failure: ExpectationFailure,
    },
    BackendCompleted {
        stats: BackendStats,
    },
    BackendFailed {
        kind: TreeKind,
        error: String,
    },
    Inconsistent {
        kind: TreeKind,
        reference: TreeKind,
        /// Keys the reference holds and this backend lacks
        missing: usize,
        /// Keys this backend holds and the reference lacks
        extra: usize,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Reasons a run ends as failed
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Workload '{0}' has no structures to run")]
    NoStructures(String),

    #[error("Backend {kind} panicked: {message}")]
    BackendPanicked { kind: TreeKind, message: String },

    #[error("{failures} expectation failures across {backends} backends")]
    ExpectationsFailed { backends: usize, failures: usize },

    #[error("Backends disagree with {reference} on the final key set: {kinds:?}")]
    Inconsistent {
        reference: TreeKind,
        kinds: Vec<TreeKind>,
    },
}

/// Key set difference between a backend and the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDiff {
    pub missing: usize,
    pub extra: usize,
}

impl KeyDiff {
    pub fn is_empty(&self) -> bool {
        self.missing == 0 && self.extra == 0
    }
}

/// Compare two ascending key lists
pub fn diff_keys(reference: &[String], keys: &[String]) -> KeyDiff {
    let reference: BTreeSet<&String> = reference.iter().collect();
    let keys: BTreeSet<&String> = keys.iter().collect();
    KeyDiff {
        missing: reference.difference(&keys).count(),
        extra: keys.difference(&reference).count(),
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Main workload execution engine
pub struct ExecutionEngine {
    strategy: SchedulingStrategy,
    executor: Arc<OperationExecutor>,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl ExecutionEngine {
    pub fn new(strategy: SchedulingStrategy) -> Self {
        Self::with_executor(strategy, OperationExecutor::new())
    }

    pub fn with_executor(strategy: SchedulingStrategy, executor: OperationExecutor) -> Self {
        Self {
            strategy,
            executor: Arc::new(executor),
            event_handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn strategy(&self) -> SchedulingStrategy {
        self.strategy
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    async fn emit_event(&self, event: ExecutionEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Execute the workload on every backend, then cross-check final key sets.
    ///
    /// The run's state and results are filled in even when an error is
    /// returned, so failed runs can still be persisted.
    pub async fn execute(&self, run: &mut Run) -> Result<(), EngineError> {
        let run_id = run.state.run_id;
        let kinds = run.workload.structures.clone();
        let workload_name = run.workload.name.clone();

        info!(
            "Starting run: {} ({}) on {} backends",
            workload_name,
            run_id,
            kinds.len()
        );
        self.emit_event(ExecutionEvent::RunStarted {
            run_id,
            workload_name: workload_name.clone(),
            backends: kinds.len(),
            operations: run.workload.len(),
        })
        .await;
        run.state.start(kinds.len());

        if kinds.is_empty() {
            error!("Workload {} has no structures", workload_name);
            self.finish(run, RunStatus::Failed).await;
            return Err(EngineError::NoStructures(workload_name));
        }

        let operations: Arc<Vec<Operation>> = Arc::new(run.workload.operations.clone());
        let mut outcomes: Vec<BackendOutcome> = Vec::with_capacity(kinds.len());
        let mut first_panic: Option<EngineError> = None;

        for batch in self.strategy.batches(&kinds) {
            debug!("Running batch: {:?}", batch);
            let mut handles = Vec::with_capacity(batch.len());
            for kind in batch {
                self.emit_event(ExecutionEvent::BackendStarted { kind }).await;
                let executor = self.executor.clone();
                let operations = operations.clone();
                let handle =
                    tokio::task::spawn_blocking(move || executor.run(kind, &operations));
                handles.push((kind, handle));
            }

            for (kind, handle) in handles {
                match handle.await {
                    Ok(outcome) => {
                        for failure in &outcome.failures {
                            self.emit_event(ExecutionEvent::ExpectationFailed {
                                kind,
                                failure: failure.clone(),
                            })
                            .await;
                        }
                        run.state.record(&outcome.stats);
                        run.results.push(outcome.stats.clone());
                        self.emit_event(ExecutionEvent::BackendCompleted {
                            stats: outcome.stats.clone(),
                        })
                        .await;
                        outcomes.push(outcome);
                    }
                    Err(err) => {
                        let message = panic_message(err);
                        error!("Backend {} panicked: {}", kind, message);
                        run.state.record_crash();
                        self.emit_event(ExecutionEvent::BackendFailed {
                            kind,
                            error: message.clone(),
                        })
                        .await;
                        first_panic.get_or_insert(EngineError::BackendPanicked { kind, message });
                    }
                }
            }
        }

        let inconsistent = self.cross_check(&outcomes).await;

        let failures: usize = outcomes.iter().map(|o| o.stats.expectation_failures).sum();
        let failing_backends = outcomes.iter().filter(|o| !o.stats.passed()).count();

        let result = if let Some(err) = first_panic {
            Err(err)
        } else if failures > 0 {
            Err(EngineError::ExpectationsFailed {
                backends: failing_backends,
                failures,
            })
        } else if let Some(err) = inconsistent {
            Err(err)
        } else {
            Ok(())
        };

        let status = if result.is_ok() {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        info!("Run finished: {} - {:?}", workload_name, status);
        self.finish(run, status).await;

        result
    }

    /// Compare every backend's key set with the BTree oracle, or with the
    /// first backend when the oracle did not run
    async fn cross_check(&self, outcomes: &[BackendOutcome]) -> Option<EngineError> {
        let reference = outcomes
            .iter()
            .find(|o| o.stats.kind == TreeKind::BTree)
            .or_else(|| outcomes.first())?;

        let mut disagreeing = Vec::new();
        for outcome in outcomes {
            if outcome.stats.kind == reference.stats.kind {
                continue;
            }
            let diff = diff_keys(&reference.keys, &outcome.keys);
            if !diff.is_empty() {
                warn!(
                    "{} disagrees with {}: {} missing, {} extra",
                    outcome.stats.kind, reference.stats.kind, diff.missing, diff.extra
                );
                self.emit_event(ExecutionEvent::Inconsistent {
                    kind: outcome.stats.kind,
                    reference: reference.stats.kind,
                    missing: diff.missing,
                    extra: diff.extra,
                })
                .await;
                disagreeing.push(outcome.stats.kind);
            }
        }

        if disagreeing.is_empty() {
            None
        } else {
            Some(EngineError::Inconsistent {
                reference: reference.stats.kind,
                kinds: disagreeing,
            })
        }
    }

    async fn finish(&self, run: &mut Run, status: RunStatus) {
        match status {
            RunStatus::Completed => run.state.complete(),
            _ => run.state.fail(),
        }
        self.emit_event(ExecutionEvent::RunCompleted {
            run_id: run.state.run_id,
            status,
        })
        .await;
    }
}
