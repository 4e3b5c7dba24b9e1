// src/engine/event_handlers.rs

//! Event handling logic for the core engine.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::Snapshot;
use crate::channel::{ChannelEvent, ChannelEventKind};
use crate::engine::core::CoreEngine;
use crate::engine::link::Link;
use crate::engine::{ConnectionId, RequestId};
use crate::errors::SyncError;
use crate::sync::{self, PONG};
use crate::types::{ConnectionStatus, ControlAction, ControlStatus};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug)]
pub enum CoreCommand {
    /// Fetch a snapshot; reply with `SnapshotLoaded`/`SnapshotFailed`.
    FetchSnapshot { request: Option<RequestId> },
    /// Open a transport tagged `connection`, tearing down any previous one.
    OpenChannel { connection: ConnectionId },
    /// Close the transport tagged `connection`.
    CloseChannel { connection: ConnectionId },
    /// Send a liveness ping on `connection`.
    SendPing { connection: ConnectionId },
    /// Arm the (single) reconnect timer.
    ScheduleReconnect { delay: Duration },
    /// Drop the reconnect timer if armed.
    CancelReconnect,
    ArmHeartbeat { interval: Duration },
    DisarmHeartbeat,
    /// (Re)arm the elapsed-time ticker from now.
    ArmTicker { interval: Duration },
    DisarmTicker,
    /// Send a control command to the backend; reply with `ControlCompleted`.
    DispatchControl {
        request: RequestId,
        action: ControlAction,
    },
    /// Answer a caller request.
    Resolve {
        request: RequestId,
        result: Result<ControlStatus, SyncError>,
    },
    /// State changed; hand a fresh copy to readers.
    Publish,
}

/// Decision returned by the core after handling a single `EngineEvent`.
#[derive(Debug)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    fn nothing() -> Self {
        Self::running(Vec::new())
    }
}

impl CoreEngine {
    pub(super) fn handle_connect(&mut self, request: RequestId) -> CoreStep {
        let mut commands = self.teardown_link();

        info!(execution = %self.state.execution_id, request, "connect requested; fetching snapshot");
        self.set_link(Link::Fetching {
            request: Some(request),
        });
        commands.push(CoreCommand::FetchSnapshot {
            request: Some(request),
        });

        CoreStep::running(commands)
    }

    pub(super) fn handle_snapshot_loaded(
        &mut self,
        request: Option<RequestId>,
        snapshot: Snapshot,
    ) -> CoreStep {
        let mut commands = Vec::new();

        if self.link != (Link::Fetching { request }) {
            debug!(?request, link = ?self.link, "stale snapshot; ignoring");
            if let Some(request) = request {
                commands.push(CoreCommand::Resolve {
                    request,
                    result: Err(SyncError::Cancelled),
                });
            }
            return CoreStep::running(commands);
        }

        sync::seed(&mut self.state, snapshot);
        commands.extend(self.restart_ticker());

        let status = self.state.control_status;
        if status.is_live() {
            commands.extend(self.open_new_connection());
        } else if request.is_some() {
            info!(execution = %self.state.execution_id, %status, "execution is not live; read-only view");
            self.set_link(Link::Idle);
        } else {
            info!(execution = %self.state.execution_id, %status, "execution ended while disconnected; not reconnecting");
            self.set_link(Link::Disconnected);
        }

        if let Some(request) = request {
            commands.push(CoreCommand::Resolve {
                request,
                result: Ok(status),
            });
        }
        commands.push(CoreCommand::Publish);

        CoreStep::running(commands)
    }

    pub(super) fn handle_snapshot_failed(
        &mut self,
        request: Option<RequestId>,
        error: SyncError,
    ) -> CoreStep {
        let mut commands = Vec::new();

        if self.link != (Link::Fetching { request }) {
            debug!(?request, error = %error, "stale snapshot failure; ignoring");
            if let Some(request) = request {
                commands.push(CoreCommand::Resolve {
                    request,
                    result: Err(error),
                });
            }
            return CoreStep::running(commands);
        }

        warn!(execution = %self.state.execution_id, error = %error, "snapshot fetch failed");
        self.state.last_error = Some(error.to_string());

        match request {
            Some(request) => {
                self.set_link(Link::Idle);
                commands.push(CoreCommand::Resolve {
                    request,
                    result: Err(error),
                });
            }
            None => {
                self.set_link(Link::Disconnected);
                commands.extend(self.maybe_schedule_reconnect());
            }
        }
        commands.push(CoreCommand::Publish);

        CoreStep::running(commands)
    }

    pub(super) fn handle_channel(&mut self, event: ChannelEvent) -> CoreStep {
        let ChannelEvent { connection, kind } = event;

        if !self.link.is_current(connection) {
            debug!(connection, ?kind, link = ?self.link, "event from stale transport; ignoring");
            return CoreStep::nothing();
        }

        match kind {
            ChannelEventKind::Opened => {
                info!(execution = %self.state.execution_id, connection, "live stream connected");
                self.set_link(Link::Connected { connection });
                self.state.last_error = None;
                CoreStep::running(vec![
                    CoreCommand::ArmHeartbeat {
                        interval: self.options.heartbeat_interval,
                    },
                    CoreCommand::Publish,
                ])
            }
            ChannelEventKind::Message(text) => self.handle_message(&text),
            ChannelEventKind::Error(message) => {
                // The close callback that follows drives the link state.
                warn!(connection, error = %message, "live stream error");
                self.state.last_error = Some(message);
                CoreStep::running(vec![CoreCommand::Publish])
            }
            ChannelEventKind::Closed => {
                info!(
                    execution = %self.state.execution_id,
                    connection,
                    status = %self.state.control_status,
                    "live stream closed"
                );
                let mut commands = vec![CoreCommand::DisarmHeartbeat];
                self.set_link(Link::Disconnected);
                commands.extend(self.maybe_schedule_reconnect());
                commands.push(CoreCommand::Publish);
                CoreStep::running(commands)
            }
        }
    }

    fn handle_message(&mut self, text: &str) -> CoreStep {
        if text.trim() == PONG {
            return CoreStep::nothing();
        }

        let event = match sync::decode(text) {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!("ignoring event of unknown type");
                return CoreStep::nothing();
            }
            Err(err) => {
                warn!(error = %err, "discarding malformed event");
                return CoreStep::nothing();
            }
        };

        debug!(kind = event.kind(), "applying event");
        let before = self.state.control_status;
        sync::apply(&mut self.state, event);

        let mut commands = self.control_transition(before);
        commands.push(CoreCommand::Publish);
        CoreStep::running(commands)
    }

    pub(super) fn handle_reconnect_due(&mut self) -> CoreStep {
        if self.link != Link::ReconnectPending {
            debug!(link = ?self.link, "reconnect timer fired without a pending reconnect; ignoring");
            return CoreStep::nothing();
        }

        let status = self.state.control_status;
        if !status.wants_reconnect() {
            info!(%status, "execution no longer running; dropping reconnect");
            self.set_link(Link::Disconnected);
            return CoreStep::running(vec![CoreCommand::Publish]);
        }

        info!(execution = %self.state.execution_id, "reconnecting live stream");
        let mut commands = if self.options.refresh_snapshot_on_reconnect {
            self.set_link(Link::Fetching { request: None });
            self.state.connection_status = ConnectionStatus::Connecting;
            vec![CoreCommand::FetchSnapshot { request: None }]
        } else {
            self.open_new_connection()
        };
        commands.push(CoreCommand::Publish);

        CoreStep::running(commands)
    }

    pub(super) fn handle_heartbeat(&mut self) -> CoreStep {
        match self.link {
            Link::Connected { connection } => {
                CoreStep::running(vec![CoreCommand::SendPing { connection }])
            }
            _ => CoreStep::nothing(),
        }
    }

    pub(super) fn handle_tick(&mut self) -> CoreStep {
        if !self.ticker_armed || self.state.control_status != ControlStatus::Running {
            return CoreStep::nothing();
        }
        self.state.elapsed_seconds += 1;
        CoreStep::running(vec![CoreCommand::Publish])
    }

    pub(super) fn handle_control_requested(
        &mut self,
        request: RequestId,
        action: ControlAction,
    ) -> CoreStep {
        let status = self.state.control_status;

        if !action.applies_to(status) {
            info!(%action, %status, "control action not applicable; ignoring");
            return CoreStep::running(vec![CoreCommand::Resolve {
                request,
                result: Err(SyncError::ControlNotApplicable { action, status }),
            }]);
        }

        debug!(%action, %status, request, "dispatching control action");
        CoreStep::running(vec![CoreCommand::DispatchControl { request, action }])
    }

    pub(super) fn handle_control_completed(
        &mut self,
        request: RequestId,
        action: ControlAction,
        result: Result<(), SyncError>,
    ) -> CoreStep {
        if let Err(error) = result {
            warn!(%action, error = %error, "control action failed; state unchanged");
            return CoreStep::running(vec![CoreCommand::Resolve {
                request,
                result: Err(error),
            }]);
        }

        let before = self.state.control_status;
        if !action.applies_to(before) {
            // A pushed status landed while the request was in flight; it wins.
            info!(%action, status = %before, "control action accepted after status moved on; keeping pushed status");
            return CoreStep::running(vec![CoreCommand::Resolve {
                request,
                result: Ok(before),
            }]);
        }

        self.state.control_status = action.optimistic_status();
        info!(%action, from = %before, to = %self.state.control_status, "control action accepted");

        let mut commands = self.control_transition(before);

        // No reconnect is wanted after an intentional stop.
        if action == ControlAction::Stop && self.link != Link::Idle {
            commands.extend(self.teardown_link());
            self.set_link(Link::Disconnected);
        }

        commands.push(CoreCommand::Resolve {
            request,
            result: Ok(self.state.control_status),
        });
        commands.push(CoreCommand::Publish);
        CoreStep::running(commands)
    }

    pub(super) fn handle_disconnect(&mut self, request: RequestId) -> CoreStep {
        info!(execution = %self.state.execution_id, "disconnect requested");
        let mut commands = self.teardown_link();
        commands.extend(self.disarm_ticker());
        self.set_link(Link::Idle);

        commands.push(CoreCommand::Resolve {
            request,
            result: Ok(self.state.control_status),
        });
        commands.push(CoreCommand::Publish);
        CoreStep::running(commands)
    }

    pub(super) fn handle_shutdown(&mut self) -> CoreStep {
        info!(execution = %self.state.execution_id, "shutdown requested");
        let mut commands = self.teardown_link();
        commands.extend(self.disarm_ticker());
        self.set_link(Link::Idle);
        commands.push(CoreCommand::Publish);

        CoreStep {
            commands,
            keep_running: false,
        }
    }

    /// Enter `link`, mirroring it into the visible connection status.
    fn set_link(&mut self, link: Link) {
        self.link = link;
        if let Some(status) = link.connection_status() {
            self.state.connection_status = status;
        }
    }

    /// Commands that release whatever the current link holds.
    ///
    /// A caller still waiting on a snapshot for this link is told it was
    /// superseded.
    fn teardown_link(&mut self) -> Vec<CoreCommand> {
        match self.link {
            Link::Connecting { connection } | Link::Connected { connection } => vec![
                CoreCommand::DisarmHeartbeat,
                CoreCommand::CloseChannel { connection },
            ],
            Link::ReconnectPending => vec![CoreCommand::CancelReconnect],
            Link::Fetching {
                request: Some(request),
            } => vec![CoreCommand::Resolve {
                request,
                result: Err(SyncError::Cancelled),
            }],
            Link::Fetching { request: None } | Link::Idle | Link::Disconnected => Vec::new(),
        }
    }

    fn open_new_connection(&mut self) -> Vec<CoreCommand> {
        self.last_connection += 1;
        let connection = self.last_connection;
        self.set_link(Link::Connecting { connection });
        vec![CoreCommand::OpenChannel { connection }]
    }

    /// After the transport dropped: arm exactly one reconnect if the task is
    /// still live server-side.
    fn maybe_schedule_reconnect(&mut self) -> Vec<CoreCommand> {
        if self.link == Link::ReconnectPending {
            return Vec::new();
        }

        let status = self.state.control_status;
        if !status.wants_reconnect() {
            debug!(%status, "not reconnecting for this status");
            return Vec::new();
        }

        let delay = self.options.reconnect_delay;
        info!(?delay, %status, "scheduling reconnect");
        self.set_link(Link::ReconnectPending);
        vec![CoreCommand::ScheduleReconnect { delay }]
    }

    /// Ticker bookkeeping for a control status change from `before`.
    fn control_transition(&mut self, before: ControlStatus) -> Vec<CoreCommand> {
        let after = self.state.control_status;
        if after == ControlStatus::Running && before != ControlStatus::Running {
            self.state.elapsed_seconds = 0;
            self.arm_ticker()
        } else if before == ControlStatus::Running && after != ControlStatus::Running {
            self.disarm_ticker()
        } else {
            Vec::new()
        }
    }

    /// After a snapshot seed: the counter is already zero, re-arm from now.
    fn restart_ticker(&mut self) -> Vec<CoreCommand> {
        if self.state.control_status == ControlStatus::Running {
            self.arm_ticker()
        } else {
            self.disarm_ticker()
        }
    }

    fn arm_ticker(&mut self) -> Vec<CoreCommand> {
        self.ticker_armed = true;
        vec![CoreCommand::ArmTicker {
            interval: self.options.tick_interval,
        }]
    }

    fn disarm_ticker(&mut self) -> Vec<CoreCommand> {
        if !self.ticker_armed {
            return Vec::new();
        }
        self.ticker_armed = false;
        vec![CoreCommand::DisarmTicker]
    }
}
