use std::sync::{Arc, Mutex};

use livesync::channel::{ChannelBackend, ChannelEvent, ChannelEventKind, ChannelFuture};
use livesync::engine::{ConnectionId, EngineEvent};
use livesync::types::ExecutionId;
use tokio::sync::mpsc;

/// One call the engine made on the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCall {
    Open(ConnectionId),
    Ping(ConnectionId),
    Close(ConnectionId),
}

/// Test-side view of a `FakeChannel`: what was called, plus a way to push
/// transport events into the engine.
#[derive(Clone, Default)]
pub struct ChannelProbe {
    calls: Arc<Mutex<Vec<ChannelCall>>>,
    events_tx: Arc<Mutex<Option<mpsc::Sender<EngineEvent>>>>,
}

impl ChannelProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ChannelCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<ConnectionId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ChannelCall::Open(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn closed(&self) -> Vec<ConnectionId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ChannelCall::Close(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn pings(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ChannelCall::Ping(_)))
            .count()
    }

    pub fn last_opened(&self) -> Option<ConnectionId> {
        self.opened().last().copied()
    }

    /// Report a transport event for `connection`, as a real socket would.
    pub async fn emit(&self, connection: ConnectionId, kind: ChannelEventKind) {
        let tx = self
            .events_tx
            .lock()
            .unwrap()
            .clone()
            .expect("probe is not attached to a channel");
        tx.send(EngineEvent::Channel(ChannelEvent::new(connection, kind)))
            .await
            .expect("engine stopped");
    }

    /// Push one text frame on `connection`.
    pub async fn frame(&self, connection: ConnectionId, text: impl Into<String>) {
        self.emit(connection, ChannelEventKind::Message(text.into()))
            .await;
    }

    /// Simulate the socket dropping: an error followed by the close.
    pub async fn drop_connection(&self, connection: ConnectionId) {
        self.emit(connection, ChannelEventKind::Error("connection reset".to_string()))
            .await;
        self.emit(connection, ChannelEventKind::Closed).await;
    }

    fn record(&self, call: ChannelCall) {
        self.calls.lock().unwrap().push(call);
    }
}

/// A fake `ChannelBackend` that records calls on its probe and, unless
/// built with `manual`, confirms every open right away.
pub struct FakeChannel {
    probe: ChannelProbe,
    events_tx: mpsc::Sender<EngineEvent>,
    auto_open: bool,
}

impl FakeChannel {
    pub fn new(events_tx: mpsc::Sender<EngineEvent>, probe: ChannelProbe) -> Self {
        *probe.events_tx.lock().unwrap() = Some(events_tx.clone());
        Self {
            probe,
            events_tx,
            auto_open: true,
        }
    }

    /// Opens are recorded but never confirmed; the test emits `Opened` itself.
    pub fn manual(events_tx: mpsc::Sender<EngineEvent>, probe: ChannelProbe) -> Self {
        Self {
            auto_open: false,
            ..Self::new(events_tx, probe)
        }
    }
}

impl ChannelBackend for FakeChannel {
    fn open<'a>(
        &'a mut self,
        _execution_id: &'a ExecutionId,
        connection: ConnectionId,
    ) -> ChannelFuture<'a> {
        self.probe.record(ChannelCall::Open(connection));
        let tx = self.events_tx.clone();
        let auto_open = self.auto_open;

        Box::pin(async move {
            if auto_open {
                tx.send(EngineEvent::Channel(ChannelEvent::new(
                    connection,
                    ChannelEventKind::Opened,
                )))
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }

    fn ping(&mut self, connection: ConnectionId) -> ChannelFuture<'_> {
        self.probe.record(ChannelCall::Ping(connection));
        Box::pin(async { Ok(()) })
    }

    fn close(&mut self, connection: ConnectionId) -> ChannelFuture<'_> {
        self.probe.record(ChannelCall::Close(connection));
        Box::pin(async { Ok(()) })
    }
}
