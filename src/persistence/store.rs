//! SQLite-based run history store

use crate::core::{BackendStats, RunStatus};
use crate::persistence::{PersistenceBackend, RunSummary};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SELECT_RUNS: &str = r#"
    SELECT id, workload_name, status, started_at, completed_at, operations, progress, backends
    FROM runs
"#;

/// SQLite run store
pub struct SqliteRunStore {
    pool: SqlitePool,
}

impl SqliteRunStore {
    /// Open (creating if needed) a store at `db_path`
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true),
        )
        .await
        .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Open a private in-memory store
    pub async fn in_memory() -> Result<Self> {
        // Every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Location used when no `--db` path is given
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prefix-trees")
            .join("runs.db")
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        Self::new(&Self::default_path()).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                workload_name TEXT NOT NULL,
                status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                operations INTEGER NOT NULL DEFAULT 0,
                progress REAL NOT NULL DEFAULT 0.0,
                backends TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_workload_name ON runs(workload_name)",
            "CREATE INDEX IF NOT EXISTS idx_started_at ON runs(started_at)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to initialize database schema")?;
        }

        Ok(())
    }

    /// Convert DateTime<Utc> to NaiveDateTime for SQLite
    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    /// Convert NaiveDateTime to DateTime<Utc>
    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn row_to_summary(row: &SqliteRow) -> Result<RunSummary> {
        let status: String = row.get("status");
        let backends: String = row.get("backends");
        let backends: Vec<BackendStats> =
            serde_json::from_str(&backends).context("Failed to decode backend stats")?;

        Ok(RunSummary {
            run_id: Uuid::parse_str(&row.get::<String, _>("id"))?,
            workload_name: row.get("workload_name"),
            status: RunStatus::parse(&status).ok_or_else(|| anyhow!("Unknown run status: {}", status))?,
            started_at: Self::from_naive(row.get("started_at")),
            completed_at: row
                .get::<Option<NaiveDateTime>, _>("completed_at")
                .map(Self::from_naive),
            operations: row.get::<i64, _>("operations") as usize,
            progress: row.get("progress"),
            backends,
        })
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for SqliteRunStore {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        let backends = serde_json::to_string(&run.backends).context("Failed to encode backend stats")?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO runs
            (id, workload_name, status, started_at, completed_at, operations, progress, backends)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(run.run_id.to_string())
        .bind(&run.workload_name)
        .bind(format!("{:?}", run.status))
        .bind(Self::to_naive(run.started_at))
        .bind(run.completed_at.map(Self::to_naive))
        .bind(run.operations as i64)
        .bind(run.progress)
        .bind(backends)
        .execute(&self.pool)
        .await
        .context("Failed to save run")?;

        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_RUNS))
            .bind(run_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load run")?;

        row.as_ref().map(Self::row_to_summary).transpose()
    }

    async fn list_runs(&self, workload_name: &str) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(&format!(
            "{} WHERE workload_name = ?1 ORDER BY started_at DESC",
            SELECT_RUNS
        ))
        .bind(workload_name)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list runs")?;

        rows.iter().map(Self::row_to_summary).collect()
    }

    async fn list_workloads(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT workload_name
            FROM runs
            ORDER BY workload_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list workloads")?;

        Ok(rows.iter().map(|row| row.get("workload_name")).collect())
    }

    async fn delete_run(&self, run_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM runs WHERE id = ?1")
            .bind(run_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete run")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeKind;

    fn summary(workload: &str) -> RunSummary {
        let mut stats = BackendStats::new(TreeKind::Art);
        stats.inserts = 3;
        stats.final_len = 3;
        RunSummary {
            run_id: Uuid::new_v4(),
            workload_name: workload.to_string(),
            status: RunStatus::Completed,
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
            operations: 3,
            progress: 1.0,
            backends: vec![stats, BackendStats::new(TreeKind::BTree)],
        }
    }

    #[tokio::test]
    async fn test_sqlite_store() {
        let store = SqliteRunStore::in_memory().await.unwrap();

        let summary = summary("test-workload");
        store.save_run(&summary).await.unwrap();

        let loaded = store.load_run(summary.run_id).await.unwrap().unwrap();

        assert_eq!(loaded.workload_name, summary.workload_name);
        assert_eq!(loaded.status, summary.status);
        assert_eq!(loaded.operations, 3);
        assert_eq!(loaded.backends, summary.backends);
        assert!(store.load_run(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("runs.db");

        let first = summary("alpha");
        {
            let store = SqliteRunStore::new(&path).await.unwrap();
            store.save_run(&first).await.unwrap();
            store.save_run(&summary("beta")).await.unwrap();
        }

        // Reopen and find what was written
        let store = SqliteRunStore::new(&path).await.unwrap();
        assert_eq!(store.list_workloads().await.unwrap(), vec!["alpha", "beta"]);
        let runs = store.list_runs("alpha").await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id, first.run_id);

        assert!(store.delete_run(first.run_id).await.unwrap());
        assert!(!store.delete_run(first.run_id).await.unwrap());
        assert!(store.list_runs("alpha").await.unwrap().is_empty());
    }
}
