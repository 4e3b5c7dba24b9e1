// src/channel/mod.rs

//! Persistent event stream for one execution.

pub mod backend;
pub mod ws;

pub use backend::{ChannelBackend, ChannelEvent, ChannelEventKind, ChannelFuture};
pub use ws::{PING, WsChannelBackend};
