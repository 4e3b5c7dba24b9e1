// src/api/client.rs

//! Pluggable request/response backend abstraction.
//!
//! The engine talks to a `LiveApi` instead of an HTTP client directly, so
//! tests can swap in a fake that returns canned snapshots and records which
//! control commands were sent.

use std::future::Future;
use std::pin::Pin;

use crate::api::model::Snapshot;
use crate::errors::Result;
use crate::types::{ControlAction, ExecutionId};

/// Boxed future returned by [`LiveApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Snapshot fetcher + control endpoint.
pub trait LiveApi: Send + Sync {
    /// Fetch the authoritative current state of an execution.
    ///
    /// Fails with `SyncError::NotFound` when the execution doesn't exist.
    fn fetch_snapshot<'a>(&'a self, execution_id: &'a ExecutionId) -> ApiFuture<'a, Snapshot>;

    /// Send one pause/resume/stop command. Never retried by the caller.
    fn send_control<'a>(
        &'a self,
        execution_id: &'a ExecutionId,
        action: ControlAction,
    ) -> ApiFuture<'a, ()>;
}
