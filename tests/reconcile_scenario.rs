// tests/reconcile_scenario.rs

mod common;
use crate::common::{frames, init_tracing, SnapshotBuilder};

use serde_json::json;

use livesync::state::{ExecutionState, LogEntry, LOG_CAPACITY};
use livesync::sync::{apply, decode, seed, ServerEvent};
use livesync::types::{ControlStatus, ExecutionId, LogLevel, StepStatus};

fn seeded(builder: SnapshotBuilder) -> ExecutionState {
    let mut state = ExecutionState::new(ExecutionId::new("42"));
    seed(&mut state, builder.build());
    state
}

fn apply_frame(state: &mut ExecutionState, text: &str) {
    let event = decode(text)
        .expect("frame should decode")
        .expect("frame type should be known");
    apply(state, event);
}

#[test]
fn full_run_scenario_ends_completed() {
    init_tracing();

    let mut state = seeded(SnapshotBuilder::running());
    assert_eq!(state.control_status, ControlStatus::Running);

    apply_frame(&mut state, &frames::step_update(1, "running"));
    apply_frame(&mut state, &frames::log("INFO", "start"));
    apply_frame(&mut state, &frames::screenshot("abc"));
    apply_frame(
        &mut state,
        &frames::step_update_with(1, json!({ "status": "completed", "duration_ms": 500 })),
    );
    apply_frame(&mut state, &frames::complete("completed", None));

    assert_eq!(state.steps.len(), 1);
    let step = &state.steps[0];
    assert_eq!(step.step_number, 1);
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.duration_ms, Some(500));

    let logs = state.logs.to_vec();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, LogLevel::Info);
    assert_eq!(logs[0].message, "start");

    assert_eq!(state.latest_screenshot.as_deref(), Some("abc"));
    assert_eq!(state.control_status, ControlStatus::Completed);
    assert_eq!(state.last_error, None);
}

#[test]
fn seed_sorts_and_dedups_steps_and_tracks_running_step() {
    let state = seeded(
        SnapshotBuilder::running()
            .step(3, "pending", "third")
            .step(1, "completed", "first")
            .step(2, "running", "second")
            .step(1, "completed", "first again")
            .progress(1, 3)
            .screenshot("frame-0"),
    );

    let numbers: Vec<u32> = state.steps.iter().map(|s| s.step_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(state.current_step_number, Some(2));
    assert_eq!(state.completed_steps, 1);
    assert_eq!(state.total_steps, 3);
    assert_eq!(state.percentage(), 33);
    assert_eq!(state.latest_screenshot.as_deref(), Some("frame-0"));
    assert_eq!(state.task_id, Some(7));
    assert_eq!(state.elapsed_seconds, 0);
}

#[test]
fn seed_keeps_only_the_newest_logs() {
    let state = seeded(SnapshotBuilder::running().logs(LOG_CAPACITY + 20));

    assert_eq!(state.logs.len(), LOG_CAPACITY);
    let first = state.logs.iter().next().expect("logs present");
    assert_eq!(first.message, "seed line 20");
    assert_eq!(
        state.logs.last().map(|e| e.message.as_str()),
        Some("seed line 119")
    );
}

#[test]
fn stopping_flag_refines_running_snapshot() {
    let state = seeded(SnapshotBuilder::running().stopping());
    assert_eq!(state.control_status, ControlStatus::Stopping);

    let state = seeded(SnapshotBuilder::new(ControlStatus::Completed).stopping());
    assert_eq!(state.control_status, ControlStatus::Completed);
}

#[test]
fn step_update_merges_only_provided_fields() {
    let mut state = seeded(SnapshotBuilder::running().step(1, "running", "open page"));

    apply_frame(
        &mut state,
        &frames::step_update_with(
            1,
            json!({ "status": "failed", "description": null, "error_message": "timeout" }),
        ),
    );

    let step = state.step(1).expect("step 1");
    assert_eq!(step.status, StepStatus::Failed);
    assert_eq!(step.description, "open page");
    assert_eq!(step.action_type.as_deref(), Some("click"));
    assert_eq!(step.error_message.as_deref(), Some("timeout"));
}

#[test]
fn out_of_order_step_updates_stay_sorted() {
    let mut state = seeded(SnapshotBuilder::running());

    for n in [5, 2, 9, 2, 1] {
        apply_frame(&mut state, &frames::step_update(n, "pending"));
    }

    let numbers: Vec<u32> = state.steps.iter().map(|s| s.step_number).collect();
    assert_eq!(numbers, vec![1, 2, 5, 9]);
    assert_eq!(state.current_step_number, None);

    apply_frame(&mut state, &frames::step_update(5, "running"));
    assert_eq!(state.current_step().map(|s| s.step_number), Some(5));
}

#[test]
fn skipped_is_a_valid_step_status() {
    let mut state = seeded(SnapshotBuilder::running());
    apply_frame(&mut state, &frames::step_update(4, "skipped"));
    assert_eq!(state.step(4).map(|s| s.status), Some(StepStatus::Skipped));
}

#[test]
fn progress_update_sets_counters_without_touching_steps() {
    let mut state = seeded(SnapshotBuilder::running().step(1, "completed", "a"));

    apply_frame(&mut state, &frames::progress(4, 10));

    assert_eq!(state.completed_steps, 4);
    assert_eq!(state.total_steps, 10);
    assert_eq!(state.percentage(), 40);
    assert_eq!(state.steps.len(), 1);
}

#[test]
fn initial_logs_replace_the_buffer() {
    let mut state = seeded(SnapshotBuilder::running().log("INFO", "from snapshot"));

    apply_frame(&mut state, &frames::initial_logs(&["one", "two"]));

    let messages: Vec<String> = state.logs.iter().map(|e| e.message.clone()).collect();
    assert_eq!(messages, vec!["one".to_string(), "two".to_string()]);
}

#[test]
fn log_levels_parse_case_insensitively() {
    let mut state = seeded(SnapshotBuilder::running());
    apply_frame(&mut state, &frames::log("warning", "slow page"));
    apply_frame(&mut state, &frames::log("Success", "done"));

    let levels: Vec<LogLevel> = state.logs.iter().map(|e| e.level).collect();
    assert_eq!(levels, vec![LogLevel::Warn, LogLevel::Success]);
}

#[test]
fn control_update_and_completion_set_status() {
    let mut state = seeded(SnapshotBuilder::running());

    apply_frame(&mut state, &frames::control("paused"));
    assert_eq!(state.control_status, ControlStatus::Paused);

    apply_frame(&mut state, &frames::complete("failed", Some("element not found")));
    assert_eq!(state.control_status, ControlStatus::Failed);
    assert_eq!(state.last_error.as_deref(), Some("element not found"));
}

#[test]
fn resumed_control_update_means_running() {
    let mut state = seeded(SnapshotBuilder::new(ControlStatus::Paused));

    apply_frame(&mut state, &frames::control("resumed"));

    assert_eq!(state.control_status, ControlStatus::Running);
}

#[test]
fn snapshot_step_rows_with_null_columns_seed_defaults() {
    let snapshot: livesync::api::Snapshot = serde_json::from_value(json!({
        "execution": {
            "status": "running",
            "task_id": 7,
            "total_steps": null,
            "completed_steps": null,
        },
        "steps": [{
            "step_number": 1,
            "action_type": "navigate",
            "description": null,
            "status": null,
            "input_value": null,
            "error_message": null,
            "duration_ms": null,
        }],
        "logs": [],
        "screenshot": null,
    }))
    .expect("backend row shape decodes");

    let mut state = ExecutionState::new(ExecutionId::new("42"));
    seed(&mut state, snapshot);

    assert_eq!(state.total_steps, 0);
    let step = state.step(1).expect("step seeded");
    assert_eq!(step.description, "");
    assert_eq!(step.status, StepStatus::Pending);
    assert_eq!(step.action_type.as_deref(), Some("navigate"));
}

#[test]
fn late_step_update_after_completion_still_applies() {
    let mut state = seeded(SnapshotBuilder::running());
    apply_frame(&mut state, &frames::complete("completed", None));
    apply_frame(&mut state, &frames::step_update(5, "completed"));

    assert_eq!(state.control_status, ControlStatus::Completed);
    assert!(state.step(5).is_some());
}

#[test]
fn unknown_event_types_decode_to_none() {
    let decoded = decode(r#"{"type":"agent_thought","data":{"text":"hmm"}}"#)
        .expect("well-formed frame");
    assert!(decoded.is_none());
}

#[test]
fn malformed_frames_are_errors() {
    assert!(decode("not json").is_err());
    assert!(decode(r#"{"type":"step_update","data":{"status":"running"}}"#).is_err());
    assert!(decode(r#"{"type":"log","data":{"level":"LOUD","message":"x"}}"#).is_err());
    assert!(decode(r#"{"type":"control_update","data":{"status":"exploded"}}"#).is_err());
}

#[test]
fn decoded_event_kinds_match_wire_names() {
    let event = decode(&frames::progress(1, 2)).unwrap().unwrap();
    assert_eq!(event.kind(), "progress_update");
    assert!(matches!(event, ServerEvent::ProgressUpdate(_)));

    let entry = LogEntry::new(LogLevel::Error, "boom");
    assert_eq!(entry.timestamp, None);
}
