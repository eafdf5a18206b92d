//! Scenario-based tests for prefix-trees

mod expectation_failures;
mod generated;
mod history;
mod shared_prefixes;
mod strategies;
