// src/render.rs

//! Plain-text rendering of an `ExecutionState` for the CLI.

use std::fmt::Write as _;

use crate::state::{ExecutionState, LogEntry, Step};

/// How many log lines the full summary shows.
const SUMMARY_LOG_LINES: usize = 10;

/// `3725` -> `"01:02:05"`.
pub fn format_elapsed(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

pub fn format_step(step: &Step) -> String {
    let mut line = format!("#{:<3} [{}] {}", step.step_number, step.status, step.description);
    if let Some(action) = &step.action_type {
        let _ = write!(line, " ({action})");
    }
    if let Some(ms) = step.duration_ms {
        let _ = write!(line, " {ms}ms");
    }
    if let Some(err) = &step.error_message {
        let _ = write!(line, " error: {err}");
    }
    line
}

pub fn format_log(entry: &LogEntry) -> String {
    let level = entry.level.to_string();
    match &entry.timestamp {
        Some(ts) => format!("{ts} {level:<7} {}", entry.message),
        None => format!("{level:<7} {}", entry.message),
    }
}

/// One-line header: id, statuses, progress and elapsed time.
pub fn format_header(state: &ExecutionState) -> String {
    format!(
        "execution {} | {} | stream {} | {}/{} steps ({}%) | {}",
        state.execution_id,
        state.control_status,
        state.connection_status,
        state.completed_steps,
        state.total_steps,
        state.percentage(),
        format_elapsed(state.elapsed_seconds),
    )
}

/// Full multi-line view, as printed by `livesync show`.
pub fn render_summary(state: &ExecutionState) -> String {
    let mut out = format_header(state);
    out.push('\n');

    if let Some(task_id) = state.task_id {
        let _ = writeln!(out, "task: {task_id}");
    }
    if let Some(step) = state.current_step() {
        let _ = writeln!(out, "current: {}", format_step(step));
    }

    if !state.steps.is_empty() {
        out.push_str("steps:\n");
        for step in &state.steps {
            let _ = writeln!(out, "  {}", format_step(step));
        }
    }

    if !state.logs.is_empty() {
        let skip = state.logs.len().saturating_sub(SUMMARY_LOG_LINES);
        let _ = writeln!(out, "logs (last {} of {}):", state.logs.len() - skip, state.logs.len());
        for entry in state.logs.iter().skip(skip) {
            let _ = writeln!(out, "  {}", format_log(entry));
        }
    }

    if state.latest_screenshot.is_some() {
        out.push_str("screenshot: available\n");
    }
    if let Some(result) = &state.result {
        let _ = writeln!(out, "result: {result}");
    }
    if let Some(err) = &state.last_error {
        let _ = writeln!(out, "error: {err}");
    }

    out
}

/// Human-readable lines describing what changed between two published
/// states, as printed by `livesync watch`. Elapsed-time ticks alone produce
/// nothing.
pub fn describe_changes(prev: &ExecutionState, next: &ExecutionState) -> Vec<String> {
    let mut lines = Vec::new();

    if prev.connection_status != next.connection_status {
        lines.push(format!("stream: {}", next.connection_status));
    }
    if prev.control_status != next.control_status {
        lines.push(format!("status: {}", next.control_status));
    }

    for step in &next.steps {
        match prev.step(step.step_number) {
            Some(old) if old == step => {}
            _ => lines.push(format!("step {}", format_step(step))),
        }
    }

    if (prev.completed_steps, prev.total_steps) != (next.completed_steps, next.total_steps) {
        lines.push(format!(
            "progress: {}/{} ({}%)",
            next.completed_steps,
            next.total_steps,
            next.percentage()
        ));
    }

    for entry in new_log_entries(prev, next) {
        lines.push(format!("log {}", format_log(entry)));
    }

    if prev.latest_screenshot != next.latest_screenshot && next.latest_screenshot.is_some() {
        lines.push("screenshot updated".to_string());
    }
    if prev.result != next.result {
        if let Some(result) = &next.result {
            lines.push(format!("result: {result}"));
        }
    }
    if prev.last_error != next.last_error {
        if let Some(err) = &next.last_error {
            lines.push(format!("error: {err}"));
        }
    }

    lines
}

/// Entries of `next` that come after the newest entry `prev` already had.
///
/// The buffer is bounded, so counting is not enough once it is full.
fn new_log_entries<'a>(prev: &ExecutionState, next: &'a ExecutionState) -> Vec<&'a LogEntry> {
    let entries: Vec<&LogEntry> = next.logs.iter().collect();
    let start = match prev.logs.last() {
        None => 0,
        Some(last) => match entries.iter().rposition(|e| *e == last) {
            Some(idx) => idx + 1,
            None => 0,
        },
    };
    entries[start..].to_vec()
}
