// src/sync/reconcile.rs

//! Merging of snapshots and pushed events into `ExecutionState`.
//!
//! Everything here is synchronous and total: every known event applies, in
//! arrival order, with no reordering buffer. An event that arrives "late"
//! (e.g. a `step_update` after `execution_complete`) still applies.

use tracing::debug;

use crate::api::Snapshot;
use crate::state::{ExecutionState, StepPatch};
use crate::sync::event::ServerEvent;
use crate::types::StepStatus;

/// Reset `state` from an authoritative snapshot.
///
/// Connection status is left alone (it describes the transport, which the
/// snapshot knows nothing about). The elapsed counter is reset to zero.
pub fn seed(state: &mut ExecutionState, snapshot: Snapshot) {
    let control_status = snapshot.effective_status();
    let Snapshot {
        execution,
        mut steps,
        logs,
        screenshot,
        ..
    } = snapshot;

    steps.sort_by_key(|s| s.step_number);
    steps.dedup_by_key(|s| s.step_number);

    state.current_step_number = steps
        .iter()
        .find(|s| s.status == StepStatus::Running)
        .map(|s| s.step_number);
    state.steps = steps;
    state.control_status = control_status;
    state.total_steps = execution.total_steps;
    state.completed_steps = execution.completed_steps;
    state.logs.replace(logs);
    state.latest_screenshot = screenshot;
    state.elapsed_seconds = 0;
    state.result = execution.result;
    state.task_id = execution.task_id;

    debug!(
        execution = %state.execution_id,
        status = %state.control_status,
        steps = state.steps.len(),
        logs = state.logs.len(),
        "seeded state from snapshot"
    );
}

/// Apply one pushed event to `state`.
pub fn apply(state: &mut ExecutionState, event: ServerEvent) {
    match event {
        ServerEvent::StepUpdate(patch) => apply_step_update(state, patch),
        ServerEvent::ScreenshotUpdate(update) => {
            state.latest_screenshot = Some(update.screenshot);
        }
        ServerEvent::Log(entry) => state.logs.push(entry),
        ServerEvent::InitialLogs(initial) => state.logs.replace(initial.logs),
        ServerEvent::ProgressUpdate(progress) => {
            state.completed_steps = progress.current_step;
            state.total_steps = progress.total_steps;
        }
        ServerEvent::ControlUpdate(update) => {
            state.control_status = update.status;
        }
        ServerEvent::ExecutionComplete(complete) => {
            state.control_status = complete.status;
            if complete.error.is_some() {
                state.last_error = complete.error;
            }
            if complete.result.is_some() {
                state.result = complete.result;
            }
        }
    }
}

/// Insert or shallow-merge a step, keeping `steps` sorted and unique.
fn apply_step_update(state: &mut ExecutionState, patch: StepPatch) {
    let step_number = patch.step_number;

    if patch.status == Some(StepStatus::Running) {
        state.current_step_number = Some(step_number);
    }

    match state
        .steps
        .binary_search_by_key(&step_number, |s| s.step_number)
    {
        Ok(idx) => state.steps[idx].merge(&patch),
        Err(idx) => state.steps.insert(idx, patch.into_step()),
    }
}
