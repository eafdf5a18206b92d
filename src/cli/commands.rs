//! CLI command definitions

use crate::execution::SchedulingStrategy;
use crate::tree::TreeKind;
use clap::Args;

/// Concurrency used by `parallel-limited` when `--max-parallel` is absent
pub const DEFAULT_MAX_PARALLEL: usize = 2;

/// Run a workload
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to workload YAML file
    #[arg(short, long)]
    pub file: String,

    /// Structures to run against, overriding the workload (repeatable)
    #[arg(long, value_enum)]
    pub structure: Vec<TreeKind>,

    /// Scheduling strategy
    #[arg(long, value_enum, default_value_t = SchedulingStrategyArg::Sequential)]
    pub strategy: SchedulingStrategyArg,

    /// Backends run at once with `parallel-limited`
    #[arg(long, default_value_t = DEFAULT_MAX_PARALLEL)]
    pub max_parallel: usize,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

impl RunCommand {
    pub fn scheduling(&self) -> SchedulingStrategy {
        match self.strategy {
            SchedulingStrategyArg::ParallelLimited => SchedulingStrategy::LimitedParallel(self.max_parallel),
            other => other.into(),
        }
    }
}

/// Validate a workload file
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to workload YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Walk through the structures on fixed keys
#[derive(Debug, Args, Clone)]
pub struct DemoCommand {
    /// Print the radix tree level by level
    #[arg(long)]
    pub show_tree: bool,
}

/// List workloads with recorded runs
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Show run counts
    #[arg(long)]
    pub with_counts: bool,

    /// Only list workload names matching this regex
    #[arg(long)]
    pub filter: Option<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Workload name to filter by
    #[arg(short, long)]
    pub workload: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show per-backend details
    #[arg(long)]
    pub verbose: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a single run
    #[arg(long)]
    pub run_id: Option<String>,
}

/// Scheduling strategy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchedulingStrategyArg {
    Sequential,
    Parallel,
    #[value(name = "parallel-limited")]
    ParallelLimited,
}

impl From<SchedulingStrategyArg> for SchedulingStrategy {
    fn from(arg: SchedulingStrategyArg) -> Self {
        match arg {
            SchedulingStrategyArg::Sequential => SchedulingStrategy::Sequential,
            SchedulingStrategyArg::Parallel => SchedulingStrategy::Parallel,
            SchedulingStrategyArg::ParallelLimited => SchedulingStrategy::LimitedParallel(DEFAULT_MAX_PARALLEL),
        }
    }
}
