// src/state/execution.rs

use crate::state::log_buffer::LogBuffer;
use crate::state::step::Step;
use crate::types::{ConnectionStatus, ControlStatus, ExecutionId};

/// Everything the live view knows about one execution.
///
/// Owned by a single engine instance; readers only ever see clones of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionState {
    pub execution_id: ExecutionId,
    pub connection_status: ConnectionStatus,
    pub control_status: ControlStatus,
    /// Sorted ascending by `step_number`, no duplicates.
    pub steps: Vec<Step>,
    pub current_step_number: Option<u32>,
    pub total_steps: u32,
    pub completed_steps: u32,
    pub logs: LogBuffer,
    pub latest_screenshot: Option<String>,
    pub elapsed_seconds: u64,
    pub last_error: Option<String>,
    /// Final result text reported with `execution_complete`, if any.
    pub result: Option<String>,
    pub task_id: Option<i64>,
}

impl ExecutionState {
    pub fn new(execution_id: ExecutionId) -> Self {
        Self {
            execution_id,
            connection_status: ConnectionStatus::Idle,
            control_status: ControlStatus::Pending,
            steps: Vec::new(),
            current_step_number: None,
            total_steps: 0,
            completed_steps: 0,
            logs: LogBuffer::new(),
            latest_screenshot: None,
            elapsed_seconds: 0,
            last_error: None,
            result: None,
            task_id: None,
        }
    }

    pub fn step(&self, step_number: u32) -> Option<&Step> {
        self.steps
            .binary_search_by_key(&step_number, |s| s.step_number)
            .ok()
            .map(|idx| &self.steps[idx])
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.current_step_number.and_then(|n| self.step(n))
    }

    /// Progress as a whole percentage, `0` when the total is unknown.
    pub fn percentage(&self) -> u32 {
        if self.total_steps == 0 {
            return 0;
        }
        let pct = (u64::from(self.completed_steps) * 100) / u64::from(self.total_steps);
        pct.min(100) as u32
    }
}
