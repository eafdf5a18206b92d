//! Command-line interface

pub mod commands;
pub mod demo;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{DemoCommand, HistoryCommand, ListCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Prefix tree workload runner
#[derive(Debug, Parser, Clone)]
#[command(name = "prefix-trees")]
#[command(version)]
#[command(about = "Run key/value workloads against radix trees, tries and adaptive radix trees", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the run history database
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a workload against one or more structures
    Run(RunCommand),

    /// Validate a workload file
    Validate(ValidateCommand),

    /// Walk through the structures on a fixed sequence of keys
    Demo(DemoCommand),

    /// List workloads with recorded runs
    List(ListCommand),

    /// Show run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::SchedulingStrategy;
    use crate::tree::TreeKind;
    use commands::SchedulingStrategyArg;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "prefix-trees",
            "run",
            "-f",
            "words.yaml",
            "--structure",
            "art",
            "--structure",
            "btree",
            "--strategy",
            "parallel-limited",
            "--max-parallel",
            "2",
            "--no-history",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Command::Run(cmd) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(cmd.file, "words.yaml");
        assert_eq!(cmd.structure, vec![TreeKind::Art, TreeKind::BTree]);
        assert_eq!(cmd.strategy, SchedulingStrategyArg::ParallelLimited);
        assert_eq!(cmd.scheduling(), SchedulingStrategy::LimitedParallel(2));
        assert!(cmd.no_history);
    }

    #[test]
    fn test_parse_history_with_global_db() {
        let cli = Cli::try_parse_from([
            "prefix-trees",
            "history",
            "--workload",
            "words",
            "--limit",
            "3",
            "--db",
            "/tmp/runs.db",
        ])
        .unwrap();

        assert_eq!(cli.db, Some(PathBuf::from("/tmp/runs.db")));
        let Command::History(cmd) = cli.command else {
            panic!("expected history command");
        };
        assert_eq!(cmd.workload.as_deref(), Some("words"));
        assert_eq!(cmd.limit, 3);
        assert!(!cmd.json);
    }

    #[test]
    fn test_rejects_unknown_structure() {
        let result = Cli::try_parse_from(["prefix-trees", "run", "-f", "w.yaml", "--structure", "hash"]);
        assert!(result.is_err());
    }
}
