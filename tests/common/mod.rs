#![allow(dead_code)]

pub use livesync_test_utils::builders::{frames, SnapshotBuilder};
pub use livesync_test_utils::{init_tracing, with_timeout};

use livesync::api::Snapshot;
use livesync::channel::{ChannelEvent, ChannelEventKind};
use livesync::engine::{
    ConnectionId, CoreCommand, CoreEngine, CoreStep, EngineEvent, EngineOptions, RequestId,
};
use livesync::types::ExecutionId;

pub fn execution_id() -> ExecutionId {
    ExecutionId::new("42")
}

/// Core after `connect` with `snapshot` and (when live) a confirmed stream.
pub fn connected_core(snapshot: Snapshot) -> CoreEngine {
    connected_core_with(snapshot, EngineOptions::default())
}

pub fn connected_core_with(snapshot: Snapshot, options: EngineOptions) -> CoreEngine {
    let mut core = CoreEngine::new(execution_id(), options);
    core.step(EngineEvent::ConnectRequested { request: 1 });
    let step = core.step(EngineEvent::SnapshotLoaded {
        request: Some(1),
        snapshot: Box::new(snapshot),
    });
    if let Some(connection) = opened_connection(&step) {
        core.step(channel(connection, ChannelEventKind::Opened));
    }
    core
}

pub fn channel(connection: ConnectionId, kind: ChannelEventKind) -> EngineEvent {
    EngineEvent::Channel(ChannelEvent::new(connection, kind))
}

/// Feed one text frame on `connection`.
pub fn push_frame(core: &mut CoreEngine, connection: ConnectionId, text: String) -> CoreStep {
    core.step(channel(connection, ChannelEventKind::Message(text)))
}

pub fn current_connection(core: &CoreEngine) -> ConnectionId {
    core.link()
        .connection()
        .expect("core has no live connection")
}

pub fn opened_connection(step: &CoreStep) -> Option<ConnectionId> {
    step.commands.iter().find_map(|c| match c {
        CoreCommand::OpenChannel { connection } => Some(*connection),
        _ => None,
    })
}

pub fn count<F>(step: &CoreStep, pred: F) -> usize
where
    F: Fn(&CoreCommand) -> bool,
{
    step.commands.iter().filter(|c| pred(c)).count()
}

pub fn has<F>(step: &CoreStep, pred: F) -> bool
where
    F: Fn(&CoreCommand) -> bool,
{
    count(step, pred) > 0
}

/// The result a `Resolve` command carries for `request`, if any.
pub fn resolution(
    step: &CoreStep,
    request: RequestId,
) -> Option<&Result<livesync::types::ControlStatus, livesync::errors::SyncError>> {
    step.commands.iter().find_map(|c| match c {
        CoreCommand::Resolve { request: r, result } if *r == request => Some(result),
        _ => None,
    })
}

/// Wait (bounded) until the published state satisfies `pred`.
pub async fn wait_for<F>(
    updates: &mut tokio::sync::watch::Receiver<livesync::state::ExecutionState>,
    pred: F,
) -> livesync::state::ExecutionState
where
    F: FnMut(&livesync::state::ExecutionState) -> bool,
{
    with_timeout(async {
        updates
            .wait_for(pred)
            .await
            .expect("engine stopped while waiting")
            .clone()
    })
    .await
}
