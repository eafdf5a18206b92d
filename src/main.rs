use anyhow::{Context, Result};
use prefix_trees::cli::commands::{DemoCommand, HistoryCommand, ListCommand, RunCommand, ValidateCommand};
use prefix_trees::cli::demo::{run_demo, ART_DELETED, RADIX_DELETED};
use prefix_trees::cli::output::*;
use prefix_trees::cli::{Cli, Command};
use prefix_trees::core::{Run, RunStatus, WorkloadConfig};
use prefix_trees::execution::{ExecutionEngine, ExecutionEvent};
use prefix_trees::persistence::{
    create_summary, InMemoryPersistence, PersistenceBackend, RunSummary, SqliteRunStore,
};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let db = cli.db.as_deref();
    match &cli.command {
        Command::Run(cmd) => run_workload(cmd, db).await?,
        Command::Validate(cmd) => validate_workload(cmd)?,
        Command::Demo(cmd) => demo(cmd)?,
        Command::List(cmd) => list_workloads(cmd, db).await?,
        Command::History(cmd) => show_history(cmd, db).await?,
    }

    Ok(())
}

async fn open_store(db: Option<&Path>) -> Result<SqliteRunStore> {
    let store = match db {
        Some(path) => SqliteRunStore::new(path).await,
        None => SqliteRunStore::with_default_path().await,
    };
    store.context("Failed to open run history")
}

async fn run_workload(cmd: &RunCommand, db: Option<&Path>) -> Result<()> {
    let config = WorkloadConfig::from_file(&cmd.file).context("Failed to load workload config")?;

    println!("{} Loaded workload: {}", INFO, style(&config.name).bold());
    if let Some(description) = &config.description {
        println!("  {}", style(description).dim());
    }

    let workload = config.to_workload().with_structures(cmd.structure.clone());
    let mut run = Run::new(workload);

    // Set up persistence
    let store: Arc<dyn PersistenceBackend> = if cmd.no_history {
        Arc::new(InMemoryPersistence::new())
    } else {
        Arc::new(open_store(db).await?)
    };

    let engine = ExecutionEngine::new(cmd.scheduling());

    // Console output; the bar advances once per finished backend
    let progress = create_progress_bar(run.workload.structures.len());
    let bar = progress.clone();
    engine
        .add_event_handler(move |event| {
            bar.println(format_execution_event(&event));
            if matches!(
                event,
                ExecutionEvent::BackendCompleted { .. } | ExecutionEvent::BackendFailed { .. }
            ) {
                bar.inc(1);
            }
        })
        .await;

    println!();
    let result = engine.execute(&mut run).await;
    progress.finish_and_clear();

    // Save to history
    let summary = create_summary(&run);
    store.save_run(&summary).await?;
    if !cmd.no_history {
        println!(
            "\n{} Run saved to history (ID: {})",
            INFO,
            style(&summary.run_id.to_string()[..8]).dim()
        );
    }

    println!();
    for stats in &run.results {
        println!("  {}", format_backend_stats(stats));
    }

    match result {
        Ok(()) => {
            println!(
                "\n{} {} completed {}",
                CHECK,
                style(&run.workload.name).bold(),
                style("successfully").green()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(&run.workload.name).bold(),
                style("failed").red()
            );
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn validate_workload(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating workload...", INFO);

    match WorkloadConfig::from_file(&cmd.file) {
        Ok(config) => {
            let workload = config.to_workload();
            println!("{} Workload configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            let structures: Vec<&str> = config.structures.iter().map(|kind| kind.name()).collect();
            println!("  Structures: {}", style(structures.join(", ")).cyan());
            println!("  Explicit operations: {}", style(config.operations.len()).cyan());
            println!("  Total operations: {}", style(workload.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn demo(cmd: &DemoCommand) -> Result<()> {
    let report = run_demo()?;

    println!("{} Adaptive radix tree (u32 keys, {} deleted)", TREE, ART_DELETED);
    for (key, value) in &report.art_found {
        println!("  find {:>4} -> {}", style(key).cyan(), value);
    }
    let stats = &report.art_stats;
    println!(
        "  {} leaves, nodes: {} N4, {} N16, {} N48, {} N256",
        stats.leaves, stats.node4, stats.node16, stats.node48, stats.node256
    );

    println!("\n{} Radix tree", TREE);
    println!("  keys: {}", report.radix_keys.join(", "));
    if cmd.show_tree {
        println!("  before deleting {}:", style(RADIX_DELETED).yellow());
        println!("{}", format_levels(&report.radix_before));
        println!("  after:");
        println!("{}", format_levels(&report.radix_after));
    }

    println!("\n{} Trie", TREE);
    println!("  words: {}", report.trie_words.join(", "));
    for (prefix, found) in &report.trie_prefixes {
        let icon = if *found { CHECK } else { CROSS };
        println!("  {}starts with '{}'", icon, prefix);
    }

    Ok(())
}

async fn list_workloads(cmd: &ListCommand, db: Option<&Path>) -> Result<()> {
    let filter = cmd
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("Invalid --filter pattern")?;

    let store = open_store(db).await?;
    let workloads: Vec<String> = store
        .list_workloads()
        .await?
        .into_iter()
        .filter(|name| filter.as_ref().map_or(true, |re| re.is_match(name)))
        .collect();

    if workloads.is_empty() {
        println!("{} No workloads found in history", INFO);
        return Ok(());
    }

    let mut json_data = Vec::new();
    if !cmd.json {
        println!("{} Workloads in history:", INFO);
    }

    for workload_name in &workloads {
        let runs = store.list_runs(workload_name).await?;
        let completed = runs.iter().filter(|r| r.status == RunStatus::Completed).count();
        let failed = runs.iter().filter(|r| r.status == RunStatus::Failed).count();

        if cmd.json {
            json_data.push(serde_json::json!({
                "name": workload_name,
                "run_count": runs.len(),
                "completed": completed,
                "failed": failed,
            }));
        } else if cmd.with_counts {
            println!(
                "  {} ({} runs: {} succeeded, {} failed)",
                style(workload_name).bold(),
                style(runs.len()).cyan(),
                style(completed).green(),
                style(failed).red()
            );
        } else {
            println!("  {}", style(workload_name).bold());
        }
    }

    if cmd.json {
        let data = serde_json::json!({ "workloads": json_data });
        println!("{}", serde_json::to_string_pretty(&data)?);
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand, db: Option<&Path>) -> Result<()> {
    let store = open_store(db).await?;

    // If a specific run ID is requested
    if let Some(run_id_str) = &cmd.run_id {
        let run_id = uuid::Uuid::parse_str(run_id_str).context("Invalid run ID format")?;
        match store.load_run(run_id).await? {
            Some(summary) if cmd.json => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Some(summary) => print_run_details(&summary, cmd.verbose),
            None => println!("{} Run not found", WARN),
        }
        return Ok(());
    }

    // List runs for one workload or all
    let mut runs = if let Some(workload_name) = &cmd.workload {
        store.list_runs(workload_name).await?
    } else {
        let mut all_runs = Vec::new();
        for workload in store.list_workloads().await? {
            all_runs.extend(store.list_runs(&workload).await?);
        }
        all_runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all_runs
    };
    runs.truncate(cmd.limit);

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, runs.len());
    for summary in &runs {
        println!("  {}", format_run_summary(summary));
        if cmd.verbose {
            for stats in &summary.backends {
                println!("      {}", format_backend_stats(stats));
            }
        }
    }

    Ok(())
}

fn print_run_details(summary: &RunSummary, verbose: bool) {
    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.run_id).cyan());
    println!("  Workload: {}", style(&summary.workload_name).bold());
    println!("  Status: {}", format_status(summary.status));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
    }
    if let Some(duration) = summary.duration().and_then(|d| d.to_std().ok()) {
        println!("  Duration: {}", style(format_duration(duration)).dim());
    }
    println!(
        "  Operations: {} on {} backends ({})",
        style(summary.operations).cyan(),
        summary.backends.len(),
        style(format!("{:.0}%", summary.progress * 100.0)).cyan()
    );

    for stats in &summary.backends {
        println!("    {}", format_backend_stats(stats));
        if verbose && stats.expectation_failures > 0 {
            println!(
                "      {} {} expectation failures",
                WARN,
                style(stats.expectation_failures).red()
            );
        }
    }
}

fn format_duration(duration: std::time::Duration) -> String {
    let millis = duration.as_millis();
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{:03}s", secs, millis % 1000)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
