//! Run state models

use crate::core::workload::Workload;
use crate::tree::TreeKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run has not started
    Pending,
    /// Run is executing
    Running,
    /// Every backend finished, all expectations held and backends agree
    Completed,
    /// A backend panicked, an expectation failed or backends disagree
    Failed,
}

impl RunStatus {
    /// Parse the `Debug` form stored in history
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(RunStatus::Pending),
            "Running" => Some(RunStatus::Running),
            "Completed" => Some(RunStatus::Completed),
            "Failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

/// Counters for one backend's pass over a workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStats {
    /// Structure the workload ran against
    pub kind: TreeKind,

    /// Insert operations executed
    pub inserts: usize,

    /// Inserts that replaced an existing value
    pub replaced: usize,

    /// Find operations executed
    pub finds: usize,

    /// Finds that returned a value
    pub hits: usize,

    /// Finds that returned nothing
    pub misses: usize,

    /// Delete operations executed
    pub deletes: usize,

    /// Deletes that removed a key
    pub removed: usize,

    /// Keys left in the structure at the end
    pub final_len: usize,

    /// Finds whose result did not match their expectation
    pub expectation_failures: usize,

    /// Wall time spent applying operations, in microseconds
    pub elapsed_us: u64,
}

impl BackendStats {
    pub fn new(kind: TreeKind) -> Self {
        Self {
            kind,
            inserts: 0,
            replaced: 0,
            finds: 0,
            hits: 0,
            misses: 0,
            deletes: 0,
            removed: 0,
            final_len: 0,
            expectation_failures: 0,
            elapsed_us: 0,
        }
    }

    pub fn operations(&self) -> usize {
        self.inserts + self.finds + self.deletes
    }

    /// Throughput, 0 when nothing was timed
    pub fn ops_per_sec(&self) -> f64 {
        if self.elapsed_us == 0 {
            return 0.0;
        }
        self.operations() as f64 * 1_000_000.0 / self.elapsed_us as f64
    }

    pub fn passed(&self) -> bool {
        self.expectation_failures == 0
    }
}

/// Overall run state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current status
    pub status: RunStatus,

    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run completed or failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of backends scheduled
    pub total_backends: usize,

    /// Backends that finished with every expectation met
    pub completed_backends: usize,

    /// Backends that panicked or missed an expectation
    pub failed_backends: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Pending,
            started_at: None,
            completed_at: None,
            total_backends: 0,
            completed_backends: 0,
            failed_backends: 0,
        }
    }

    /// Mark run as started
    pub fn start(&mut self, total_backends: usize) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_backends = total_backends;
    }

    /// Count a finished backend
    pub fn record(&mut self, stats: &BackendStats) {
        if stats.passed() {
            self.completed_backends += 1;
        } else {
            self.failed_backends += 1;
        }
    }

    /// Count a backend that never produced stats
    pub fn record_crash(&mut self) {
        self.failed_backends += 1;
    }

    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Fraction of backends finished (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_backends == 0 {
            return 0.0;
        }
        (self.completed_backends + self.failed_backends) as f64 / self.total_backends as f64
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// A workload together with the state and results of running it
#[derive(Debug, Clone)]
pub struct Run {
    pub workload: Workload,
    pub state: RunState,
    /// Per-backend results in completion order
    pub results: Vec<BackendStats>,
}

impl Run {
    pub fn new(workload: Workload) -> Self {
        Self {
            workload,
            state: RunState::new(),
            results: Vec::new(),
        }
    }

    pub fn result(&self, kind: TreeKind) -> Option<&BackendStats> {
        self.results.iter().find(|stats| stats.kind == kind)
    }
}
