//! Persistence layer for run history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteRunStore;

pub use crate::core::RunStatus;
use crate::core::{BackendStats, Run};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Summary of a workload run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run ID
    pub run_id: Uuid,

    /// Workload name
    pub workload_name: String,

    /// Run status
    pub status: RunStatus,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (if finished)
    pub completed_at: Option<DateTime<Utc>>,

    /// Operations in the workload
    pub operations: usize,

    /// Progress (0.0 to 1.0)
    pub progress: f64,

    /// Per-backend results
    pub backends: Vec<BackendStats>,
}

impl RunSummary {
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|done| done - self.started_at)
    }
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Save a run, replacing any earlier record with the same ID
    async fn save_run(&self, run: &RunSummary) -> Result<()>;

    /// Load a run by ID
    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>>;

    /// List runs of a workload, newest first
    async fn list_runs(&self, workload_name: &str) -> Result<Vec<RunSummary>>;

    /// List workload names that have runs, sorted
    async fn list_workloads(&self) -> Result<Vec<String>>;

    /// Delete a run, returning whether it existed
    async fn delete_run(&self, run_id: Uuid) -> Result<bool>;
}

/// In-memory persistence (for testing or `--no-history`)
pub struct InMemoryPersistence {
    runs: RwLock<HashMap<Uuid, RunSummary>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for InMemoryPersistence {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        let mut runs = self.runs.write().await;
        runs.insert(run.run_id, run.clone());
        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let runs = self.runs.read().await;
        Ok(runs.get(&run_id).cloned())
    }

    async fn list_runs(&self, workload_name: &str) -> Result<Vec<RunSummary>> {
        let runs = self.runs.read().await;
        let mut result: Vec<RunSummary> = runs
            .values()
            .filter(|run| run.workload_name == workload_name)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(result)
    }

    async fn list_workloads(&self) -> Result<Vec<String>> {
        let runs = self.runs.read().await;
        let mut names: Vec<String> = runs.values().map(|run| run.workload_name.clone()).collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn delete_run(&self, run_id: Uuid) -> Result<bool> {
        let mut runs = self.runs.write().await;
        Ok(runs.remove(&run_id).is_some())
    }
}

/// Create a summary from a run
pub fn create_summary(run: &Run) -> RunSummary {
    RunSummary {
        run_id: run.state.run_id,
        workload_name: run.workload.name.clone(),
        status: run.state.status,
        started_at: run.state.started_at.unwrap_or_else(Utc::now),
        completed_at: run.state.completed_at,
        operations: run.workload.len(),
        progress: run.state.progress(),
        backends: run.results.clone(),
    }
}
