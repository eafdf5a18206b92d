//! Operation executor - replays a workload against one key store

use crate::core::{BackendStats, Expectation, Operation};
use crate::tree::{KeyStore, TreeKind};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Failures kept per backend; further ones are only counted
pub const DEFAULT_FAILURE_LIMIT: usize = 20;

/// A find whose result did not match its expectation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationFailure {
    /// Position of the operation in the workload
    pub index: usize,
    pub key: String,
    pub expected: Expectation,
    pub actual: Option<u64>,
}

/// Everything a backend produced
#[derive(Debug, Clone)]
pub struct BackendOutcome {
    pub stats: BackendStats,
    /// First failures, up to the executor's limit
    pub failures: Vec<ExpectationFailure>,
    /// Final key set, ascending
    pub keys: Vec<String>,
}

/// Builds the empty store a backend runs on
pub type StoreFactory = Arc<dyn Fn(TreeKind) -> Box<dyn KeyStore> + Send + Sync>;

/// Applies operations to a fresh store of a given kind
#[derive(Clone)]
pub struct OperationExecutor {
    failure_limit: usize,
    factory: StoreFactory,
}

impl OperationExecutor {
    pub fn new() -> Self {
        Self {
            failure_limit: DEFAULT_FAILURE_LIMIT,
            factory: Arc::new(|kind: TreeKind| kind.build()),
        }
    }

    pub fn with_failure_limit(mut self, limit: usize) -> Self {
        self.failure_limit = limit;
        self
    }

    /// Build stores with `factory` instead of [`TreeKind::build`]
    pub fn with_store_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(TreeKind) -> Box<dyn KeyStore> + Send + Sync + 'static,
    {
        self.factory = Arc::new(factory);
        self
    }

    /// Build an empty store of `kind` and run every operation on it
    pub fn run(&self, kind: TreeKind, operations: &[Operation]) -> BackendOutcome {
        let mut store = (self.factory)(kind);
        self.run_on(store.as_mut(), operations)
    }

    /// Run every operation on an existing store
    pub fn run_on(&self, store: &mut dyn KeyStore, operations: &[Operation]) -> BackendOutcome {
        let kind = store.kind();
        let mut stats = BackendStats::new(kind);
        let mut failures = Vec::new();
        debug!("Running {} operations on {}", operations.len(), kind);

        let started = Instant::now();
        for (index, op) in operations.iter().enumerate() {
            match op {
                Operation::Insert { key, value } => {
                    stats.inserts += 1;
                    if store.insert(key, *value).is_some() {
                        stats.replaced += 1;
                    }
                }
                Operation::Find { key, expect } => {
                    stats.finds += 1;
                    let actual = store.find(key);
                    if actual.is_some() {
                        stats.hits += 1;
                    } else {
                        stats.misses += 1;
                    }
                    if !expect.is_met(actual) {
                        stats.expectation_failures += 1;
                        if failures.len() < self.failure_limit {
                            failures.push(ExpectationFailure {
                                index,
                                key: key.clone(),
                                expected: *expect,
                                actual,
                            });
                        }
                    }
                }
                Operation::Delete { key } => {
                    stats.deletes += 1;
                    if store.delete(key).is_some() {
                        stats.removed += 1;
                    }
                }
            }
        }
        stats.elapsed_us = started.elapsed().as_micros() as u64;
        stats.final_len = store.len();

        if stats.expectation_failures > 0 {
            warn!(
                "{}: {} expectation failures",
                kind, stats.expectation_failures
            );
        }

        BackendOutcome {
            stats,
            failures,
            keys: store.keys(),
        }
    }
}

impl fmt::Debug for OperationExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationExecutor")
            .field("failure_limit", &self.failure_limit)
            .finish_non_exhaustive()
    }
}

impl Default for OperationExecutor {
    fn default() -> Self {
        Self::new()
    }
}
