//! Core domain models
//!
//! Workload configuration, the runnable workload, and run state.

pub mod config;
pub mod state;
pub mod workload;

pub use config::{ConfigError, WorkloadConfig};
pub use state::*;
pub use workload::*;
