// src/state/step.rs

//! Steps of an execution and the partial updates the server pushes for them.

use serde::{Deserialize, Serialize};

use crate::types::{null_as_default, StepStatus};

/// One discrete action within an execution, keyed by `step_number`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Step {
    pub step_number: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: StepStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub input_value: Option<String>,
}

impl Step {
    pub fn new(step_number: u32, status: StepStatus) -> Self {
        Self {
            step_number,
            status,
            description: String::new(),
            action_type: None,
            duration_ms: None,
            error_message: None,
            input_value: None,
        }
    }

    /// Shallow merge: every field present in `patch` overwrites ours.
    pub fn merge(&mut self, patch: &StepPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(ref description) = patch.description {
            self.description = description.clone();
        }
        if let Some(ref action_type) = patch.action_type {
            self.action_type = Some(action_type.clone());
        }
        if let Some(duration_ms) = patch.duration_ms {
            self.duration_ms = Some(duration_ms);
        }
        if let Some(ref error_message) = patch.error_message {
            self.error_message = Some(error_message.clone());
        }
        if let Some(ref input_value) = patch.input_value {
            self.input_value = Some(input_value.clone());
        }
    }
}

/// Payload of a `step_update` event.
///
/// Absent fields and explicit JSON `null`s both mean "not provided".
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct StepPatch {
    pub step_number: u32,
    #[serde(default)]
    pub status: Option<StepStatus>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub input_value: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl StepPatch {
    pub fn into_step(self) -> Step {
        let mut step = Step::new(self.step_number, StepStatus::Pending);
        step.merge(&self);
        step
    }
}
