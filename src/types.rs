// src/types.rs

//! Enums and identifiers shared by every layer of the sync engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque identifier of one execution (one run of a task).
///
/// The backend uses integers, but the engine never does arithmetic on it, so
/// it is kept as text and accepted from JSON as either a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ExecutionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("execution id must not be empty".to_string());
        }
        if trimmed.contains('/') {
            return Err(format!("execution id must not contain '/': {trimmed}"));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl<'de> Deserialize<'de> for ExecutionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => ExecutionId(s),
            Raw::Number(n) => ExecutionId(n.to_string()),
        })
    }
}

/// Deserialize a nullable column, mapping JSON `null` to `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// State of the transport to the event stream. Independent of the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

/// Lifecycle of the task execution itself, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlStatus {
    #[default]
    Pending,
    /// `resumed` is what the controller broadcasts after a resume.
    #[serde(alias = "resumed")]
    Running,
    Paused,
    Stopping,
    Stopped,
    Completed,
    Failed,
}

impl ControlStatus {
    /// Stopped, Completed and Failed never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ControlStatus::Stopped | ControlStatus::Completed | ControlStatus::Failed
        )
    }

    /// Statuses for which a live view should open the event stream.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            ControlStatus::Running | ControlStatus::Pending | ControlStatus::Paused
        )
    }

    /// Statuses for which a dropped stream is re-established automatically.
    pub fn wants_reconnect(self) -> bool {
        matches!(self, ControlStatus::Running | ControlStatus::Pending)
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControlStatus::Pending => "pending",
            ControlStatus::Running => "running",
            ControlStatus::Paused => "paused",
            ControlStatus::Stopping => "stopping",
            ControlStatus::Stopped => "stopped",
            ControlStatus::Completed => "completed",
            ControlStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Status of a single step inside an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Severity attached to a streamed log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Success,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "SUCCESS" => Ok(LogLevel::Success),
            other => Err(format!(
                "invalid log level: {other} (expected DEBUG, INFO, WARN, ERROR or SUCCESS)"
            )),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Success => "SUCCESS",
        };
        f.write_str(s)
    }
}

/// Imperative command a user can send to a running execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Pause,
    Resume,
    Stop,
}

impl ControlAction {
    /// Whether this action makes sense for an execution in `status`.
    pub fn applies_to(self, status: ControlStatus) -> bool {
        match self {
            ControlAction::Pause => status == ControlStatus::Running,
            ControlAction::Resume => status == ControlStatus::Paused,
            ControlAction::Stop => {
                matches!(status, ControlStatus::Running | ControlStatus::Paused)
            }
        }
    }

    /// Status applied locally once the backend accepted the command.
    pub fn optimistic_status(self) -> ControlStatus {
        match self {
            ControlAction::Pause => ControlStatus::Paused,
            ControlAction::Resume => ControlStatus::Running,
            ControlAction::Stop => ControlStatus::Stopped,
        }
    }

    /// Path segment of the control endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            ControlAction::Pause => "pause",
            ControlAction::Resume => "resume",
            ControlAction::Stop => "stop",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pause" => Ok(ControlAction::Pause),
            "resume" => Ok(ControlAction::Resume),
            "stop" => Ok(ControlAction::Stop),
            other => Err(format!(
                "invalid control action: {other} (expected \"pause\", \"resume\" or \"stop\")"
            )),
        }
    }
}
