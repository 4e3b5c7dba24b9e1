// src/state/log_buffer.rs

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::LogLevel;

/// Maximum number of log lines retained per execution.
pub const LOG_CAPACITY: usize = 100;

/// One streamed log line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            level,
            message: message.into(),
        }
    }
}

/// Bounded FIFO of log lines; the oldest entry is evicted first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > LOG_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// Replace the whole buffer, keeping only the newest `LOG_CAPACITY` lines.
    pub fn replace(&mut self, entries: Vec<LogEntry>) {
        let skip = entries.len().saturating_sub(LOG_CAPACITY);
        self.entries = entries.into_iter().skip(skip).collect();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}
