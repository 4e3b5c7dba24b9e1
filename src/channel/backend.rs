// src/channel/backend.rs

//! Pluggable event-stream transport abstraction.
//!
//! The runtime talks to a `ChannelBackend` instead of a websocket directly.
//! Transport callbacks (opened, message, error, closed) flow back to the
//! runtime as `EngineEvent::Channel` on the sender the backend was built with.
//!
//! - `WsChannelBackend` is the production implementation.
//! - Tests provide a backend that records calls and lets them inject
//!   transport events by hand.

use std::future::Future;
use std::pin::Pin;

use crate::engine::ConnectionId;
use crate::errors::Result;
use crate::types::ExecutionId;

/// Boxed future returned by [`ChannelBackend`] methods.
pub type ChannelFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// What happened on a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEventKind {
    /// Handshake succeeded.
    Opened,
    /// One text frame from the server, undecoded.
    Message(String),
    /// The transport reported an error; a `Closed` usually follows.
    Error(String),
    /// The transport is gone.
    Closed,
}

/// A transport callback tagged with the connection it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub connection: ConnectionId,
    pub kind: ChannelEventKind,
}

impl ChannelEvent {
    pub fn new(connection: ConnectionId, kind: ChannelEventKind) -> Self {
        Self { connection, kind }
    }
}

/// Trait abstracting the persistent event stream for one execution.
///
/// Implementations keep at most one live transport: `open` tears down any
/// previous one first. A transport closed through `close` must not report a
/// `Closed` event afterwards (the engine already knows).
pub trait ChannelBackend: Send {
    /// Start connecting. Completion is reported through `ChannelEventKind::Opened`
    /// (or `Error` + `Closed`), not through the returned future.
    fn open<'a>(&'a mut self, execution_id: &'a ExecutionId, connection: ConnectionId)
        -> ChannelFuture<'a>;

    /// Fire-and-forget liveness ping.
    fn ping(&mut self, connection: ConnectionId) -> ChannelFuture<'_>;

    /// Close the transport. Idempotent; unknown or stale ids are ignored.
    fn close(&mut self, connection: ConnectionId) -> ChannelFuture<'_>;
}
