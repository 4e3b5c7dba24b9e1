// tests/core_link.rs

mod common;
use crate::common::{
    channel, connected_core, connected_core_with, count, current_connection, execution_id, has,
    init_tracing, opened_connection, push_frame, resolution, frames, SnapshotBuilder,
};

use std::time::Duration;

use livesync::channel::ChannelEventKind;
use livesync::engine::{CoreCommand, CoreEngine, EngineEvent, EngineOptions, Link};
use livesync::errors::SyncError;
use livesync::types::{ConnectionStatus, ControlStatus};

fn is_schedule(c: &CoreCommand) -> bool {
    matches!(c, CoreCommand::ScheduleReconnect { .. })
}

#[test]
fn connect_fetches_then_opens_then_connects() {
    init_tracing();
    let mut core = CoreEngine::new(execution_id(), EngineOptions::default());
    assert_eq!(core.state().connection_status, ConnectionStatus::Idle);

    let step = core.step(EngineEvent::ConnectRequested { request: 1 });
    assert!(has(&step, |c| matches!(
        c,
        CoreCommand::FetchSnapshot { request: Some(1) }
    )));
    assert_eq!(core.link(), Link::Fetching { request: Some(1) });

    let step = core.step(EngineEvent::SnapshotLoaded {
        request: Some(1),
        snapshot: Box::new(SnapshotBuilder::running().build()),
    });
    let connection = opened_connection(&step).expect("stream opened");
    assert!(matches!(
        resolution(&step, 1),
        Some(Ok(ControlStatus::Running))
    ));
    assert_eq!(core.state().connection_status, ConnectionStatus::Connecting);

    let step = core.step(channel(connection, ChannelEventKind::Opened));
    assert_eq!(core.state().connection_status, ConnectionStatus::Connected);
    assert!(has(&step, |c| matches!(
        c,
        CoreCommand::ArmHeartbeat { interval } if *interval == Duration::from_secs(30)
    )));
}

#[test]
fn historical_execution_is_read_only() {
    let mut core = CoreEngine::new(execution_id(), EngineOptions::default());
    core.step(EngineEvent::ConnectRequested { request: 1 });
    let step = core.step(EngineEvent::SnapshotLoaded {
        request: Some(1),
        snapshot: Box::new(SnapshotBuilder::new(ControlStatus::Completed).build()),
    });

    assert!(opened_connection(&step).is_none());
    assert_eq!(core.link(), Link::Idle);
    assert_eq!(core.state().connection_status, ConnectionStatus::Idle);
    assert!(matches!(
        resolution(&step, 1),
        Some(Ok(ControlStatus::Completed))
    ));
}

#[test]
fn paused_and_pending_executions_open_the_stream() {
    for status in [ControlStatus::Paused, ControlStatus::Pending] {
        let core = connected_core(SnapshotBuilder::new(status).build());
        assert_eq!(core.state().connection_status, ConnectionStatus::Connected);
    }
}

#[test]
fn snapshot_failure_is_surfaced_and_no_stream_opens() {
    let mut core = CoreEngine::new(execution_id(), EngineOptions::default());
    core.step(EngineEvent::ConnectRequested { request: 1 });
    let step = core.step(EngineEvent::SnapshotFailed {
        request: Some(1),
        error: SyncError::NotFound(execution_id()),
    });

    assert!(opened_connection(&step).is_none());
    assert!(matches!(
        resolution(&step, 1),
        Some(Err(SyncError::NotFound(_)))
    ));
    assert_eq!(core.link(), Link::Idle);
    assert!(core.state().last_error.is_some());
}

#[test]
fn repeated_drop_signals_schedule_one_reconnect() {
    init_tracing();
    let mut core = connected_core(SnapshotBuilder::running().build());
    let connection = current_connection(&core);

    let mut schedules = 0;
    for kind in [
        ChannelEventKind::Error("reset".into()),
        ChannelEventKind::Closed,
        ChannelEventKind::Error("reset again".into()),
        ChannelEventKind::Closed,
    ] {
        let step = core.step(channel(connection, kind));
        schedules += count(&step, is_schedule);
    }

    assert_eq!(schedules, 1);
    assert_eq!(core.link(), Link::ReconnectPending);
    assert_eq!(core.state().connection_status, ConnectionStatus::Disconnected);
    assert_eq!(core.state().last_error.as_deref(), Some("reset"));
}

#[test]
fn reconnect_waits_three_seconds_then_opens_a_fresh_connection() {
    let mut core = connected_core(SnapshotBuilder::running().build());
    let first = current_connection(&core);

    let step = core.step(channel(first, ChannelEventKind::Closed));
    assert!(has(&step, |c| matches!(
        c,
        CoreCommand::ScheduleReconnect { delay } if *delay == Duration::from_secs(3)
    )));

    let step = core.step(EngineEvent::ReconnectDue);
    let second = opened_connection(&step).expect("reconnect opens the stream");
    assert_ne!(first, second);
    assert_eq!(core.state().connection_status, ConnectionStatus::Connecting);

    // Late callbacks from the first transport are ignored.
    let step = core.step(channel(first, ChannelEventKind::Closed));
    assert!(step.commands.is_empty());
    assert_eq!(core.link(), Link::Connecting { connection: second });

    core.step(channel(second, ChannelEventKind::Opened));
    assert_eq!(core.state().connection_status, ConnectionStatus::Connected);
    assert_eq!(core.state().last_error, None);
}

#[test]
fn no_reconnect_for_paused_or_finished_executions() {
    let mut core = connected_core(SnapshotBuilder::new(ControlStatus::Paused).build());
    let step = core.step(channel(current_connection(&core), ChannelEventKind::Closed));
    assert_eq!(count(&step, is_schedule), 0);
    assert_eq!(core.link(), Link::Disconnected);

    let mut core = connected_core(SnapshotBuilder::running().build());
    let connection = current_connection(&core);
    push_frame(&mut core, connection, frames::complete("completed", None));
    let step = core.step(channel(connection, ChannelEventKind::Closed));
    assert_eq!(count(&step, is_schedule), 0);
    assert_eq!(core.state().connection_status, ConnectionStatus::Disconnected);
}

#[test]
fn reconnect_is_dropped_if_execution_ended_meanwhile() {
    let mut core = connected_core(SnapshotBuilder::running().build());
    let connection = current_connection(&core);
    core.step(channel(connection, ChannelEventKind::Closed));
    assert_eq!(core.link(), Link::ReconnectPending);

    // A stop accepted while disconnected moves us out of Running.
    core.step(EngineEvent::ControlRequested {
        request: 5,
        action: livesync::types::ControlAction::Stop,
    });
    core.step(EngineEvent::ControlCompleted {
        request: 5,
        action: livesync::types::ControlAction::Stop,
        result: Ok(()),
    });
    let step = core.step(EngineEvent::ReconnectDue);
    assert!(opened_connection(&step).is_none());
}

#[test]
fn refresh_on_reconnect_fetches_before_subscribing() {
    let options = EngineOptions {
        refresh_snapshot_on_reconnect: true,
        ..EngineOptions::default()
    };
    let mut core = connected_core_with(SnapshotBuilder::running().build(), options);
    core.step(channel(current_connection(&core), ChannelEventKind::Closed));

    let step = core.step(EngineEvent::ReconnectDue);
    assert!(has(&step, |c| matches!(
        c,
        CoreCommand::FetchSnapshot { request: None }
    )));
    assert!(opened_connection(&step).is_none());
    assert_eq!(core.state().connection_status, ConnectionStatus::Connecting);

    // A failed refresh behaves like another drop.
    let step = core.step(EngineEvent::SnapshotFailed {
        request: None,
        error: SyncError::Transport("refused".into()),
    });
    assert_eq!(count(&step, is_schedule), 1);
    assert_eq!(core.link(), Link::ReconnectPending);

    core.step(EngineEvent::ReconnectDue);
    let step = core.step(EngineEvent::SnapshotLoaded {
        request: None,
        snapshot: Box::new(SnapshotBuilder::running().step(1, "running", "a").build()),
    });
    assert!(opened_connection(&step).is_some());
    assert_eq!(core.state().steps.len(), 1);
}

#[test]
fn refreshed_snapshot_of_finished_execution_stays_disconnected() {
    let options = EngineOptions {
        refresh_snapshot_on_reconnect: true,
        ..EngineOptions::default()
    };
    let mut core = connected_core_with(SnapshotBuilder::running().build(), options);
    core.step(channel(current_connection(&core), ChannelEventKind::Closed));
    core.step(EngineEvent::ReconnectDue);

    let step = core.step(EngineEvent::SnapshotLoaded {
        request: None,
        snapshot: Box::new(SnapshotBuilder::new(ControlStatus::Completed).build()),
    });
    assert!(opened_connection(&step).is_none());
    assert_eq!(core.link(), Link::Disconnected);
    assert_eq!(core.state().control_status, ControlStatus::Completed);
}

#[test]
fn heartbeat_pings_only_while_connected() {
    let mut core = connected_core(SnapshotBuilder::running().build());
    let connection = current_connection(&core);

    let step = core.step(EngineEvent::HeartbeatDue);
    assert!(has(&step, |c| matches!(
        c,
        CoreCommand::SendPing { connection: id } if *id == connection
    )));

    core.step(channel(connection, ChannelEventKind::Closed));
    let step = core.step(EngineEvent::HeartbeatDue);
    assert!(step.commands.is_empty());
}

#[test]
fn pong_and_unknown_frames_change_nothing() {
    let mut core = connected_core(SnapshotBuilder::running().build());
    let connection = current_connection(&core);
    let before = core.state().clone();

    for text in [
        "pong".to_string(),
        r#"{"type":"agent_thought","data":{}}"#.to_string(),
        "{broken".to_string(),
    ] {
        let step = push_frame(&mut core, connection, text);
        assert!(step.commands.is_empty());
    }
    assert_eq!(core.state(), &before);
}

#[test]
fn disconnect_tears_everything_down_and_is_idempotent() {
    let mut core = connected_core(SnapshotBuilder::running().build());
    let connection = current_connection(&core);

    let step = core.step(EngineEvent::DisconnectRequested { request: 7 });
    assert!(has(&step, |c| matches!(
        c,
        CoreCommand::CloseChannel { connection: id } if *id == connection
    )));
    assert!(has(&step, |c| matches!(c, CoreCommand::DisarmHeartbeat)));
    assert!(has(&step, |c| matches!(c, CoreCommand::DisarmTicker)));
    assert!(matches!(resolution(&step, 7), Some(Ok(_))));
    assert_eq!(core.state().connection_status, ConnectionStatus::Idle);

    let step = core.step(EngineEvent::DisconnectRequested { request: 8 });
    assert!(!has(&step, |c| matches!(c, CoreCommand::CloseChannel { .. })));
    assert!(matches!(resolution(&step, 8), Some(Ok(_))));

    // The torn-down transport's close must not schedule anything.
    let step = core.step(channel(connection, ChannelEventKind::Closed));
    assert!(step.commands.is_empty());
}

#[test]
fn disconnect_cancels_a_pending_reconnect() {
    let mut core = connected_core(SnapshotBuilder::running().build());
    core.step(channel(current_connection(&core), ChannelEventKind::Closed));

    let step = core.step(EngineEvent::DisconnectRequested { request: 2 });
    assert!(has(&step, |c| matches!(c, CoreCommand::CancelReconnect)));

    let step = core.step(EngineEvent::ReconnectDue);
    assert!(step.commands.is_empty());
}

#[test]
fn disconnect_while_fetching_cancels_the_connect() {
    let mut core = CoreEngine::new(execution_id(), EngineOptions::default());
    core.step(EngineEvent::ConnectRequested { request: 1 });

    let step = core.step(EngineEvent::DisconnectRequested { request: 2 });
    assert!(matches!(resolution(&step, 1), Some(Err(SyncError::Cancelled))));

    // The snapshot that arrives afterwards is discarded.
    let step = core.step(EngineEvent::SnapshotLoaded {
        request: Some(1),
        snapshot: Box::new(SnapshotBuilder::running().build()),
    });
    assert!(opened_connection(&step).is_none());
    assert_eq!(core.state().control_status, ControlStatus::Pending);
}

#[test]
fn reconnecting_by_hand_replaces_the_old_transport() {
    let mut core = connected_core(SnapshotBuilder::running().build());
    let first = current_connection(&core);

    let step = core.step(EngineEvent::ConnectRequested { request: 9 });
    assert!(has(&step, |c| matches!(
        c,
        CoreCommand::CloseChannel { connection } if *connection == first
    )));

    let step = core.step(EngineEvent::SnapshotLoaded {
        request: Some(9),
        snapshot: Box::new(SnapshotBuilder::running().build()),
    });
    let second = opened_connection(&step).expect("new transport");
    assert!(second > first);
}

#[test]
fn shutdown_stops_the_loop() {
    let mut core = connected_core(SnapshotBuilder::running().build());
    let step = core.step(EngineEvent::ShutdownRequested);

    assert!(!step.keep_running);
    assert!(has(&step, |c| matches!(c, CoreCommand::CloseChannel { .. })));
    assert!(!core.ticker_armed());
}
