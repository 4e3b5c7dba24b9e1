// src/channel/ws.rs

//! Websocket implementation of the event stream.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::channel::backend::{ChannelBackend, ChannelEvent, ChannelEventKind, ChannelFuture};
use crate::engine::{ConnectionId, EngineEvent};
use crate::errors::{Result, SyncError};
use crate::types::ExecutionId;

/// Text frame sent as heartbeat.
pub const PING: &str = "ping";

/// How long `close` waits for the close handshake before aborting the task.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Internal handle for the currently open transport.
///
/// - `outbound` carries frames to send (heartbeat pings).
/// - `cancel` asks the connection task to close the socket and exit quietly.
/// - `handle` is the Tokio task owning the socket.
struct ActiveConnection {
    connection: ConnectionId,
    outbound: mpsc::Sender<Message>,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

/// Production `ChannelBackend`: one websocket per execution.
pub struct WsChannelBackend {
    stream_base: Url,
    events_tx: mpsc::Sender<EngineEvent>,
    active: Option<ActiveConnection>,
}

impl WsChannelBackend {
    /// `stream_base` is the stream URL prefix; the execution id is appended
    /// to it (e.g. `ws://127.0.0.1:8000/ws/live/` + `42`).
    pub fn new(stream_base: Url, events_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            stream_base,
            events_tx,
            active: None,
        }
    }

    fn url_for(&self, execution_id: &ExecutionId) -> Result<Url> {
        Ok(self.stream_base.join(execution_id.as_str())?)
    }

    async fn open_inner(
        &mut self,
        execution_id: &ExecutionId,
        connection: ConnectionId,
    ) -> Result<()> {
        if let Some(previous) = self.active.take() {
            debug!(
                previous = previous.connection,
                connection, "tearing down previous transport before opening a new one"
            );
            shutdown_connection(previous).await;
        }

        let url = self.url_for(execution_id)?;
        info!(execution = %execution_id, connection, %url, "opening live stream");

        let (outbound_tx, outbound_rx) = mpsc::channel::<Message>(8);
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let events_tx = self.events_tx.clone();

        let handle = tokio::spawn(async move {
            run_connection(url, connection, events_tx, outbound_rx, cancel_rx).await;
            debug!(connection, "connection task finished");
        });

        self.active = Some(ActiveConnection {
            connection,
            outbound: outbound_tx,
            cancel: Some(cancel_tx),
            handle,
        });
        Ok(())
    }

    async fn ping_inner(&mut self, connection: ConnectionId) -> Result<()> {
        let Some(active) = self.active.as_ref().filter(|a| a.connection == connection) else {
            debug!(connection, "ping for a transport that is not active; ignoring");
            return Ok(());
        };

        active
            .outbound
            .try_send(Message::Text(PING.to_string()))
            .map_err(|e| SyncError::Transport(format!("queueing ping failed: {e}")))
    }

    async fn close_inner(&mut self, connection: ConnectionId) -> Result<()> {
        match self.active.take() {
            Some(active) if active.connection == connection => {
                info!(connection, "closing live stream");
                shutdown_connection(active).await;
            }
            other => {
                debug!(connection, "close for a transport that is not active; ignoring");
                self.active = other;
            }
        }
        Ok(())
    }
}

impl ChannelBackend for WsChannelBackend {
    fn open<'a>(
        &'a mut self,
        execution_id: &'a ExecutionId,
        connection: ConnectionId,
    ) -> ChannelFuture<'a> {
        Box::pin(self.open_inner(execution_id, connection))
    }

    fn ping(&mut self, connection: ConnectionId) -> ChannelFuture<'_> {
        Box::pin(self.ping_inner(connection))
    }

    fn close(&mut self, connection: ConnectionId) -> ChannelFuture<'_> {
        Box::pin(self.close_inner(connection))
    }
}

impl Drop for WsChannelBackend {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.abort();
        }
    }
}

/// Ask the connection task to close, wait briefly, then abort it.
async fn shutdown_connection(mut active: ActiveConnection) {
    if let Some(cancel) = active.cancel.take() {
        if cancel.send(()).is_err() {
            debug!(
                connection = active.connection,
                "connection task already finished while closing"
            );
        }
    }

    if tokio::time::timeout(CLOSE_GRACE, &mut active.handle)
        .await
        .is_err()
    {
        warn!(
            connection = active.connection,
            "close handshake did not finish in time; aborting connection task"
        );
        active.handle.abort();
    }
}

/// Own one websocket until it drops or is cancelled.
///
/// Emits `Opened`, every text frame as `Message`, and `Error`/`Closed` when
/// the socket fails. A cancelled connection emits nothing further.
async fn run_connection(
    url: Url,
    connection: ConnectionId,
    events_tx: mpsc::Sender<EngineEvent>,
    mut outbound_rx: mpsc::Receiver<Message>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let emit = |kind: ChannelEventKind| {
        let tx = events_tx.clone();
        async move {
            let _ = tx
                .send(EngineEvent::Channel(ChannelEvent::new(connection, kind)))
                .await;
        }
    };

    let connected = tokio::select! {
        res = connect_async(url.as_str()) => res,
        _ = &mut cancel_rx => {
            debug!(connection, "cancelled while connecting");
            return;
        }
    };

    let mut ws = match connected {
        Ok((ws, _response)) => ws,
        Err(err) => {
            warn!(connection, error = %err, "live stream connect failed");
            emit(ChannelEventKind::Error(err.to_string())).await;
            emit(ChannelEventKind::Closed).await;
            return;
        }
    };

    emit(ChannelEventKind::Opened).await;

    loop {
        tokio::select! {
            incoming = ws.next() => match incoming {
                Some(Ok(Message::Text(text))) => emit(ChannelEventKind::Message(text)).await,
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => emit(ChannelEventKind::Message(text)).await,
                    Err(_) => warn!(connection, "discarding non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(connection, ?frame, "server closed live stream");
                    break;
                }
                // Protocol-level ping/pong frames are answered by tungstenite.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(connection, error = %err, "live stream error");
                    emit(ChannelEventKind::Error(err.to_string())).await;
                    break;
                }
                None => break,
            },
            outbound = outbound_rx.recv() => match outbound {
                Some(frame) => {
                    if let Err(err) = ws.send(frame).await {
                        warn!(connection, error = %err, "sending on live stream failed");
                        emit(ChannelEventKind::Error(err.to_string())).await;
                        break;
                    }
                }
                None => {
                    let _ = ws.close(None).await;
                    return;
                }
            },
            _ = &mut cancel_rx => {
                debug!(connection, "closing live stream on request");
                let _ = ws.close(None).await;
                return;
            }
        }
    }

    emit(ChannelEventKind::Closed).await;
}
