// src/engine/link.rs

//! Lifecycle of the event-stream link, as tracked by the core.
//!
//! ```text
//! Idle -> Fetching -> Connecting -> Connected
//!                         |             |
//!                         +-------------+--> Disconnected -> ReconnectPending
//!                                                                  |
//!                               Fetching or Connecting <-----------+
//! ```
//!
//! Only one `ReconnectPending` can exist at a time, which is what bounds the
//! engine to a single pending reconnect timer.

use crate::engine::{ConnectionId, RequestId};
use crate::types::ConnectionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// No transport wanted (initial state, after `disconnect`, read-only views).
    Idle,
    /// Waiting for a snapshot before opening the stream. `request` is the
    /// caller waiting on it, `None` for a refresh during reconnect.
    Fetching { request: Option<RequestId> },
    /// Transport opened, handshake not yet confirmed.
    Connecting { connection: ConnectionId },
    /// Handshake confirmed.
    Connected { connection: ConnectionId },
    /// Transport dropped and no reconnect is wanted.
    Disconnected,
    /// Transport dropped; a reconnect timer is armed.
    ReconnectPending,
}

impl Link {
    /// The transport whose callbacks are currently meaningful.
    pub fn connection(self) -> Option<ConnectionId> {
        match self {
            Link::Connecting { connection } | Link::Connected { connection } => Some(connection),
            _ => None,
        }
    }

    /// Whether a transport event tagged `connection` belongs to the live link.
    pub fn is_current(self, connection: ConnectionId) -> bool {
        self.connection() == Some(connection)
    }

    /// Connection status shown for this link when entering it.
    ///
    /// `None` for `Fetching`, which keeps whatever status was shown before.
    pub fn connection_status(self) -> Option<ConnectionStatus> {
        match self {
            Link::Idle => Some(ConnectionStatus::Idle),
            Link::Fetching { .. } => None,
            Link::Connecting { .. } => Some(ConnectionStatus::Connecting),
            Link::Connected { .. } => Some(ConnectionStatus::Connected),
            Link::Disconnected | Link::ReconnectPending => Some(ConnectionStatus::Disconnected),
        }
    }
}
