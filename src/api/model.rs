// src/api/model.rs

//! Response bodies of the snapshot and control endpoints.

use serde::Deserialize;

use crate::state::{LogEntry, Step};
use crate::types::{null_as_default, ControlStatus};

/// Authoritative point-in-time state of an execution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
    pub execution: ExecutionInfo,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub control: Option<ControlFlags>,
}

impl Snapshot {
    /// Status the live view should start from.
    ///
    /// The execution row may still say `running` after a stop was requested;
    /// the controller's `is_stopping` flag refines that to `Stopping`.
    pub fn effective_status(&self) -> ControlStatus {
        let status = self.execution.status;
        match self.control {
            Some(ControlFlags {
                is_stopping: true, ..
            }) if !status.is_terminal() => ControlStatus::Stopping,
            _ => status,
        }
    }
}

/// `execution` object of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutionInfo {
    pub status: ControlStatus,
    #[serde(default)]
    pub task_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_steps: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_steps: u32,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// `control` object of the snapshot (browser controller flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct ControlFlags {
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub is_stopping: bool,
    #[serde(default)]
    pub is_running: bool,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
