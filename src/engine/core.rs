// src/engine/core.rs

//! Pure core engine state machine.
//!
//! This module contains a synchronous, deterministic "core engine" that
//! consumes [`EngineEvent`]s and produces:
//! - an updated `ExecutionState`
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels and timers
//! - performing HTTP requests and transport operations
//! - delivering replies to callers and publishing state
//!
//! The core is intended to be extensively tested without any Tokio,
//! sockets, or HTTP.

use crate::engine::link::Link;
use crate::engine::{ConnectionId, CoreStep, EngineEvent, EngineOptions};
use crate::state::ExecutionState;
use crate::types::ExecutionId;

/// Pure core engine state for one execution.
///
/// This owns:
/// - the `ExecutionState` aggregate
/// - the link state machine (transport + reconnect policy)
/// - whether the elapsed-time ticker is armed
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreEngine {
    pub(super) state: ExecutionState,
    pub(super) link: Link,
    pub(super) options: EngineOptions,
    pub(super) last_connection: ConnectionId,
    pub(super) ticker_armed: bool,
}

impl CoreEngine {
    pub fn new(execution_id: ExecutionId, options: EngineOptions) -> Self {
        Self {
            state: ExecutionState::new(execution_id),
            link: Link::Idle,
            options,
            last_connection: 0,
            ticker_armed: false,
        }
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn link(&self) -> Link {
        self.link
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Expose whether the elapsed-time ticker is armed (for tests).
    pub fn ticker_armed(&self) -> bool {
        self.ticker_armed
    }

    /// Handle a single engine event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: EngineEvent) -> CoreStep {
        match event {
            EngineEvent::ConnectRequested { request } => self.handle_connect(request),
            EngineEvent::SnapshotLoaded { request, snapshot } => {
                self.handle_snapshot_loaded(request, *snapshot)
            }
            EngineEvent::SnapshotFailed { request, error } => {
                self.handle_snapshot_failed(request, error)
            }
            EngineEvent::Channel(event) => self.handle_channel(event),
            EngineEvent::ReconnectDue => self.handle_reconnect_due(),
            EngineEvent::HeartbeatDue => self.handle_heartbeat(),
            EngineEvent::Tick => self.handle_tick(),
            EngineEvent::ControlRequested { request, action } => {
                self.handle_control_requested(request, action)
            }
            EngineEvent::ControlCompleted {
                request,
                action,
                result,
            } => self.handle_control_completed(request, action, result),
            EngineEvent::DisconnectRequested { request } => self.handle_disconnect(request),
            EngineEvent::ShutdownRequested => self.handle_shutdown(),
        }
    }
}
