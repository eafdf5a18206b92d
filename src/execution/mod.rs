//! Workload execution engine

pub mod engine;
pub mod executor;
pub mod scheduler;

pub use engine::{EngineError, EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::{BackendOutcome, ExpectationFailure, OperationExecutor, StoreFactory};
pub use scheduler::SchedulingStrategy;
