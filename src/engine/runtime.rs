// src/engine/runtime.rs

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

use crate::api::LiveApi;
use crate::channel::{ChannelBackend, ChannelEvent, ChannelEventKind};
use crate::errors::Result;
use crate::state::ExecutionState;
use crate::types::{ControlAction, ControlStatus};

use super::core::CoreEngine;
use super::{CoreCommand, EngineEvent, RequestId};

/// Reply channel for a caller request.
pub type Reply = oneshot::Sender<Result<ControlStatus>>;

/// What a `LiveSession` handle can ask of the runtime.
#[derive(Debug)]
pub enum SessionRequest {
    Connect { reply: Reply },
    Disconnect { reply: Reply },
    Control { action: ControlAction, reply: Reply },
    Shutdown,
}

/// What woke the loop up.
enum Wake {
    Request(Option<SessionRequest>),
    Event(Option<EngineEvent>),
    ReconnectDue,
    HeartbeatDue,
    Tick,
}

/// Drives the core engine in response to caller requests, transport
/// callbacks, HTTP completions and timers.
///
/// This is a pure IO shell around `CoreEngine`, which contains all the
/// sync semantics. This struct handles async IO: reading events from
/// channels, owning timers, calling the backend and publishing state.
pub struct Runtime<A: LiveApi + 'static, C: ChannelBackend> {
    core: CoreEngine,
    events_tx: mpsc::Sender<EngineEvent>,
    events_rx: mpsc::Receiver<EngineEvent>,
    requests_rx: mpsc::Receiver<SessionRequest>,
    api: Arc<A>,
    channel: C,
    state_tx: watch::Sender<ExecutionState>,
    pending: HashMap<RequestId, Reply>,
    next_request: RequestId,
    backlog: VecDeque<EngineEvent>,
    reconnect: Option<Pin<Box<Sleep>>>,
    heartbeat: Option<Interval>,
    ticker: Option<Interval>,
}

impl<A: LiveApi + 'static, C: ChannelBackend> fmt::Debug for Runtime<A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("pending", &self.pending.len())
            .field("reconnect_armed", &self.reconnect.is_some())
            .field("heartbeat_armed", &self.heartbeat.is_some())
            .field("ticker_armed", &self.ticker.is_some())
            .finish_non_exhaustive()
    }
}

impl<A: LiveApi + 'static, C: ChannelBackend> Runtime<A, C> {
    /// `events_tx` must be the sender paired with `events_rx`, and the one the
    /// channel backend reports transport callbacks on.
    pub fn new(
        core: CoreEngine,
        events_tx: mpsc::Sender<EngineEvent>,
        events_rx: mpsc::Receiver<EngineEvent>,
        requests_rx: mpsc::Receiver<SessionRequest>,
        api: Arc<A>,
        channel: C,
        state_tx: watch::Sender<ExecutionState>,
    ) -> Self {
        Self {
            core,
            events_tx,
            events_rx,
            requests_rx,
            api,
            channel,
            state_tx,
            pending: HashMap::new(),
            next_request: 0,
            backlog: VecDeque::new(),
            reconnect: None,
            heartbeat: None,
            ticker: None,
        }
    }

    /// Main event loop.
    ///
    /// - Turns session requests, transport/HTTP events and timer firings
    ///   into `EngineEvent`s.
    /// - Feeds them into the core one at a time.
    /// - Executes the commands returned by the core.
    ///
    /// Exits after a shutdown request, or once every session handle is gone.
    pub async fn run(mut self) {
        info!(execution = %self.core.state().execution_id, "live sync runtime started");

        loop {
            let event = match self.backlog.pop_front() {
                Some(event) => event,
                None => match self.wait().await {
                    Some(event) => event,
                    None => continue,
                },
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        if !self.pending.is_empty() {
            debug!(
                pending = self.pending.len(),
                "dropping unanswered requests on exit"
            );
        }
        info!("runtime exiting");
    }

    /// Wait for the next thing to happen and translate it into an event.
    ///
    /// Returns `None` when the wake-up needs no core step.
    async fn wait(&mut self) -> Option<EngineEvent> {
        let wake = tokio::select! {
            request = self.requests_rx.recv() => Wake::Request(request),
            event = self.events_rx.recv() => Wake::Event(event),
            _ = sleep_if_armed(&mut self.reconnect) => Wake::ReconnectDue,
            _ = tick_if_armed(&mut self.heartbeat) => Wake::HeartbeatDue,
            _ = tick_if_armed(&mut self.ticker) => Wake::Tick,
        };

        match wake {
            Wake::Request(Some(request)) => Some(self.admit(request)),
            Wake::Request(None) => {
                info!("all session handles dropped; shutting down");
                Some(EngineEvent::ShutdownRequested)
            }
            Wake::Event(event) => event,
            Wake::ReconnectDue => {
                self.reconnect = None;
                Some(EngineEvent::ReconnectDue)
            }
            Wake::HeartbeatDue => Some(EngineEvent::HeartbeatDue),
            Wake::Tick => Some(EngineEvent::Tick),
        }
    }

    /// Register the caller's reply slot and build the matching event.
    fn admit(&mut self, request: SessionRequest) -> EngineEvent {
        match request {
            SessionRequest::Connect { reply } => EngineEvent::ConnectRequested {
                request: self.register(reply),
            },
            SessionRequest::Disconnect { reply } => EngineEvent::DisconnectRequested {
                request: self.register(reply),
            },
            SessionRequest::Control { action, reply } => EngineEvent::ControlRequested {
                request: self.register(reply),
                action,
            },
            SessionRequest::Shutdown => EngineEvent::ShutdownRequested,
        }
    }

    fn register(&mut self, reply: Reply) -> RequestId {
        self.next_request += 1;
        let request = self.next_request;
        self.pending.insert(request, reply);
        request
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::FetchSnapshot { request } => self.spawn_fetch(request),
            CoreCommand::OpenChannel { connection } => {
                let execution_id = self.core.state().execution_id.clone();
                if let Err(err) = self.channel.open(&execution_id, connection).await {
                    warn!(connection, error = %err, "opening live stream failed");
                    self.backlog.push_back(EngineEvent::Channel(ChannelEvent::new(
                        connection,
                        ChannelEventKind::Error(err.to_string()),
                    )));
                    self.backlog.push_back(EngineEvent::Channel(ChannelEvent::new(
                        connection,
                        ChannelEventKind::Closed,
                    )));
                }
            }
            CoreCommand::CloseChannel { connection } => {
                if let Err(err) = self.channel.close(connection).await {
                    warn!(connection, error = %err, "closing live stream failed");
                }
            }
            CoreCommand::SendPing { connection } => {
                if let Err(err) = self.channel.ping(connection).await {
                    warn!(connection, error = %err, "heartbeat ping failed");
                }
            }
            CoreCommand::ScheduleReconnect { delay } => {
                self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
            }
            CoreCommand::CancelReconnect => self.reconnect = None,
            CoreCommand::ArmHeartbeat { interval } => self.heartbeat = Some(periodic(interval)),
            CoreCommand::DisarmHeartbeat => self.heartbeat = None,
            CoreCommand::ArmTicker { interval } => self.ticker = Some(periodic(interval)),
            CoreCommand::DisarmTicker => self.ticker = None,
            CoreCommand::DispatchControl { request, action } => {
                self.spawn_control(request, action)
            }
            CoreCommand::Resolve { request, result } => match self.pending.remove(&request) {
                Some(reply) => {
                    if reply.send(result).is_err() {
                        debug!(request, "caller stopped waiting for reply");
                    }
                }
                None => debug!(request, "reply for unknown request; ignoring"),
            },
            CoreCommand::Publish => {
                self.state_tx.send_replace(self.core.state().clone());
            }
        }
    }

    fn spawn_fetch(&self, request: Option<RequestId>) {
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        let execution_id = self.core.state().execution_id.clone();

        tokio::spawn(async move {
            let event = match api.fetch_snapshot(&execution_id).await {
                Ok(snapshot) => EngineEvent::SnapshotLoaded {
                    request,
                    snapshot: Box::new(snapshot),
                },
                Err(error) => EngineEvent::SnapshotFailed { request, error },
            };
            let _ = tx.send(event).await;
        });
    }

    fn spawn_control(&self, request: RequestId, action: ControlAction) {
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        let execution_id = self.core.state().execution_id.clone();

        tokio::spawn(async move {
            let result = api.send_control(&execution_id, action).await;
            let _ = tx
                .send(EngineEvent::ControlCompleted {
                    request,
                    action,
                    result,
                })
                .await;
        });
    }
}

/// First tick one full `period` from now, not immediately.
fn periodic(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn sleep_if_armed(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn tick_if_armed(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
