// src/sync/mod.rs

//! Reconciliation of server-pushed events into execution state.
//!
//! - [`event`] decodes `{type, data}` frames into typed [`ServerEvent`]s.
//! - [`reconcile`] seeds state from a snapshot and applies events to it.
//!
//! Nothing here knows about transports, timers, or reconnection; that is the
//! engine's job.

pub mod event;
pub mod reconcile;

pub use event::{decode, ServerEvent, PONG};
pub use reconcile::{apply, seed};
