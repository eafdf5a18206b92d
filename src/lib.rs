//! prefix-trees - radix tree, trie and adaptive radix tree, with a workload
//! runner that replays key/value operations against each of them

pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;
pub mod tree;

// Re-export commonly used types
pub use crate::core::{Run, RunStatus, Workload, WorkloadConfig};
pub use crate::execution::{EngineError, ExecutionEngine, ExecutionEvent, SchedulingStrategy};
pub use crate::tree::{Art, ArtKey, KeyStore, RadixTree, TreeKind, Trie};
