// src/sync/event.rs

//! Typed server-pushed events and their decoding from `{type, data}` frames.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::Result;
use crate::state::{LogEntry, StepPatch};
use crate::types::ControlStatus;

/// Text the server sends back for a heartbeat ping.
pub const PONG: &str = "pong";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScreenshotUpdate {
    pub screenshot: String,
    #[serde(default)]
    pub step_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitialLogs {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressUpdate {
    pub current_step: u32,
    pub total_steps: u32,
    #[serde(default)]
    pub percentage: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControlUpdate {
    pub status: ControlStatus,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutionComplete {
    pub status: ControlStatus,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One event pushed on the live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    StepUpdate(StepPatch),
    ScreenshotUpdate(ScreenshotUpdate),
    Log(LogEntry),
    InitialLogs(InitialLogs),
    ProgressUpdate(ProgressUpdate),
    ControlUpdate(ControlUpdate),
    ExecutionComplete(ExecutionComplete),
}

impl ServerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::StepUpdate(_) => "step_update",
            ServerEvent::ScreenshotUpdate(_) => "screenshot_update",
            ServerEvent::Log(_) => "log",
            ServerEvent::InitialLogs(_) => "initial_logs",
            ServerEvent::ProgressUpdate(_) => "progress_update",
            ServerEvent::ControlUpdate(_) => "control_update",
            ServerEvent::ExecutionComplete(_) => "execution_complete",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Decode one text frame.
///
/// - `Ok(Some(event))` for the seven known event types.
/// - `Ok(None)` for well-formed frames of a type we don't know (ignored).
/// - `Err(_)` when the frame or its payload can't be decoded.
pub fn decode(text: &str) -> Result<Option<ServerEvent>> {
    let envelope: Envelope = serde_json::from_str(text)?;

    let event = match envelope.kind.as_str() {
        "step_update" => ServerEvent::StepUpdate(serde_json::from_value(envelope.data)?),
        "screenshot_update" => {
            ServerEvent::ScreenshotUpdate(serde_json::from_value(envelope.data)?)
        }
        "log" => ServerEvent::Log(serde_json::from_value(envelope.data)?),
        "initial_logs" => ServerEvent::InitialLogs(serde_json::from_value(envelope.data)?),
        "progress_update" => {
            ServerEvent::ProgressUpdate(serde_json::from_value(envelope.data)?)
        }
        "control_update" => ServerEvent::ControlUpdate(serde_json::from_value(envelope.data)?),
        "execution_complete" => {
            ServerEvent::ExecutionComplete(serde_json::from_value(envelope.data)?)
        }
        _ => return Ok(None),
    };

    Ok(Some(event))
}
