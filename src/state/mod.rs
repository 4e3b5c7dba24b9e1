// src/state/mod.rs

//! Data model of a live execution view.
//!
//! - [`execution`] holds the root `ExecutionState` aggregate.
//! - [`step`] holds `Step` and the partial `StepPatch` pushed by the server.
//! - [`log_buffer`] holds `LogEntry` and the bounded buffer they live in.

pub mod execution;
pub mod log_buffer;
pub mod step;

pub use execution::ExecutionState;
pub use log_buffer::{LogBuffer, LogEntry, LOG_CAPACITY};
pub use step::{Step, StepPatch};
