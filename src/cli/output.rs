//! CLI output formatting

use crate::{
    core::{BackendStats, RunStatus},
    execution::ExecutionEvent,
    persistence::RunSummary,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static TREE: Emoji<'_, '_> = Emoji("🌳 ", "* ");

/// Create a progress bar over backends
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Completed => style("COMPLETED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Format a stored run for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        RunStatus::Completed => CHECK,
        RunStatus::Failed => CROSS,
        RunStatus::Running => SPINNER,
        RunStatus::Pending => INFO,
    };

    format!(
        "{} {} - {} - {} - {} ops on {} backends - {}",
        status_icon,
        style(short_id(&summary.run_id)).dim(),
        style(&summary.workload_name).bold(),
        format_status(summary.status),
        summary.operations,
        summary.backends.len(),
        style(summary.started_at.format("%Y-%m-%d %H:%M:%S").to_string()).dim()
    )
}

/// One line of per-backend counters
pub fn format_backend_stats(stats: &BackendStats) -> String {
    let icon = if stats.passed() { CHECK } else { CROSS };
    format!(
        "{} {:<6} {:>8} ins ({} replaced) {:>8} find ({} hit / {} miss) {:>8} del ({} removed)  len {:<8} {:>12.0} ops/s",
        icon,
        style(stats.kind).cyan(),
        stats.inserts,
        stats.replaced,
        stats.finds,
        stats.hits,
        stats.misses,
        stats.deletes,
        stats.removed,
        stats.final_len,
        stats.ops_per_sec()
    )
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            run_id,
            workload_name,
            backends,
            operations,
        } => format!(
            "{} Running {} ({}): {} operations on {} backends",
            ROCKET,
            style(workload_name).bold(),
            style(short_id(run_id)).dim(),
            operations,
            backends
        ),
        ExecutionEvent::BackendStarted { kind } => {
            format!("{} {}", SPINNER, style(kind).cyan())
        }
        ExecutionEvent::ExpectationFailed { kind, failure } => format!(
            "{} {}: operation {} find '{}' expected {}, got {}",
            WARN,
            style(kind).yellow(),
            failure.index,
            failure.key,
            failure.expected,
            failure
                .actual
                .map_or_else(|| "missing".to_string(), |v| v.to_string())
        ),
        ExecutionEvent::BackendCompleted { stats } => format_backend_stats(stats),
        ExecutionEvent::BackendFailed { kind, error } => {
            format!("{} {}: {}", CROSS, style(kind).red(), style(error).dim())
        }
        ExecutionEvent::Inconsistent {
            kind,
            reference,
            missing,
            extra,
        } => format!(
            "{} {} disagrees with {}: {} keys missing, {} extra",
            CROSS,
            style(kind).red(),
            style(reference).bold(),
            missing,
            extra
        ),
        ExecutionEvent::RunCompleted { run_id, status } => {
            let status_str = match status {
                RunStatus::Completed => format!("{} completed", style("successfully").green()),
                RunStatus::Failed => style("failed").red().to_string(),
                _ => format!("{:?}", status),
            };
            format!("{} Run ({}) {}", INFO, style(short_id(run_id)).dim(), status_str)
        }
    }
}

/// Render radix tree levels, one line per depth
pub fn format_levels(levels: &[Vec<String>]) -> String {
    levels
        .iter()
        .enumerate()
        .map(|(depth, labels)| {
            let labels: Vec<String> = labels
                .iter()
                .map(|label| style(format!("[{}]", label)).green().to_string())
                .collect();
            format!("  {:>2}: {}", depth, labels.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
