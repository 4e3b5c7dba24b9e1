// src/engine/mod.rs

//! Live execution sync engine.
//!
//! This module ties together:
//! - the reconciliation of pushed events into state
//! - the event-stream lifecycle (connect, heartbeat, reconnect)
//! - the control dispatcher with optimistic status transitions
//! - the elapsed-time ticker
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::time::Duration;

use crate::api::Snapshot;
use crate::channel::ChannelEvent;
use crate::errors::SyncError;
use crate::types::ControlAction;

/// Identifies one opened transport. Never reused within an engine.
pub type ConnectionId = u64;

/// Identifies one caller request awaiting a reply.
pub type RequestId = u64;

/// Timing knobs used by both the core and the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Delay before the single reconnect attempt after a drop.
    pub reconnect_delay: Duration,
    /// Period of the liveness ping while connected.
    pub heartbeat_interval: Duration,
    /// Period of the elapsed-time ticker.
    pub tick_interval: Duration,
    /// Re-fetch the snapshot before re-subscribing after a drop.
    pub refresh_snapshot_on_reconnect: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(3),
            heartbeat_interval: Duration::from_secs(30),
            tick_interval: Duration::from_secs(1),
            refresh_snapshot_on_reconnect: false,
        }
    }
}

/// Events flowing into the engine from callers, transports, HTTP completions
/// and timers. Processed strictly one at a time.
#[derive(Debug)]
pub enum EngineEvent {
    /// Caller asked to (re)connect: fetch a snapshot, then open the stream.
    ConnectRequested { request: RequestId },
    /// A snapshot fetch finished. `request` is `None` for reconnect refreshes.
    SnapshotLoaded {
        request: Option<RequestId>,
        snapshot: Box<Snapshot>,
    },
    /// A snapshot fetch failed.
    SnapshotFailed {
        request: Option<RequestId>,
        error: SyncError,
    },
    /// Transport callback.
    Channel(ChannelEvent),
    /// The reconnect timer fired.
    ReconnectDue,
    /// The heartbeat interval fired.
    HeartbeatDue,
    /// The elapsed-time ticker fired.
    Tick,
    /// Caller asked for pause/resume/stop.
    ControlRequested {
        request: RequestId,
        action: ControlAction,
    },
    /// The control request to the backend finished.
    ControlCompleted {
        request: RequestId,
        action: ControlAction,
        result: Result<(), SyncError>,
    },
    /// Caller asked to tear the stream down (the view stays alive).
    DisconnectRequested { request: RequestId },
    /// The view is going away; tear everything down and stop.
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod link;
pub mod runtime;

pub use self::core::CoreEngine;
pub use event_handlers::{CoreCommand, CoreStep};
pub use link::Link;
pub use runtime::{Runtime, SessionRequest};
