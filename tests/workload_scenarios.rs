//! Scenario-based tests: whole workloads through the execution engine

mod helpers;
mod scenarios;
