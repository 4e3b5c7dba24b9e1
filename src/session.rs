// src/session.rs

//! Caller-facing handle to one live execution view.
//!
//! A `LiveSession` owns nothing but channels: the engine runs in its own
//! Tokio task and publishes every state change on a `watch` channel.
//! Readers only ever get clones of the state, never a mutable reference.
//!
//! Dropping the last handle shuts the engine down.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::LiveApi;
use crate::channel::ChannelBackend;
use crate::engine::{CoreEngine, EngineEvent, EngineOptions, Runtime, SessionRequest};
use crate::errors::{Result, SyncError};
use crate::state::ExecutionState;
use crate::types::{ControlAction, ControlStatus, ExecutionId};

const REQUEST_QUEUE: usize = 16;
const EVENT_QUEUE: usize = 256;

pub struct LiveSession {
    execution_id: ExecutionId,
    requests_tx: mpsc::Sender<SessionRequest>,
    state_rx: watch::Receiver<ExecutionState>,
    handle: Option<JoinHandle<()>>,
}

impl LiveSession {
    /// Spawn the engine for `execution_id` on the current Tokio runtime.
    ///
    /// `make_channel` receives the sender transport callbacks must be
    /// reported on. Nothing is fetched until [`LiveSession::connect`].
    pub fn spawn<A, C, F>(
        execution_id: ExecutionId,
        options: EngineOptions,
        api: Arc<A>,
        make_channel: F,
    ) -> Self
    where
        A: LiveApi + 'static,
        C: ChannelBackend + 'static,
        F: FnOnce(mpsc::Sender<EngineEvent>) -> C,
    {
        let (events_tx, events_rx) = mpsc::channel::<EngineEvent>(EVENT_QUEUE);
        let (requests_tx, requests_rx) = mpsc::channel::<SessionRequest>(REQUEST_QUEUE);

        let core = CoreEngine::new(execution_id.clone(), options);
        let (state_tx, state_rx) = watch::channel(core.state().clone());
        let channel = make_channel(events_tx.clone());

        let runtime = Runtime::new(
            core,
            events_tx,
            events_rx,
            requests_rx,
            api,
            channel,
            state_tx,
        );
        let handle = tokio::spawn(runtime.run());

        Self {
            execution_id,
            requests_tx,
            state_rx,
            handle: Some(handle),
        }
    }

    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    /// Copy of the latest published state.
    pub fn state(&self) -> ExecutionState {
        self.state_rx.borrow().clone()
    }

    /// Receiver that is notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
        self.state_rx.clone()
    }

    /// Fetch the snapshot, seed the state and, when the execution is still
    /// live, open the event stream.
    ///
    /// Resolves with the seeded control status once the snapshot is applied.
    pub async fn connect(&self) -> Result<ControlStatus> {
        self.request(|reply| SessionRequest::Connect { reply }).await
    }

    /// Tear down the stream, timers and any pending reconnect. The state
    /// stays readable.
    pub async fn disconnect(&self) -> Result<ControlStatus> {
        self.request(|reply| SessionRequest::Disconnect { reply }).await
    }

    /// Dispatch one control action.
    ///
    /// Fails with `ControlNotApplicable` (state untouched) when the action
    /// doesn't apply to the current status. On backend acceptance resolves
    /// with the optimistic status.
    pub async fn control(&self, action: ControlAction) -> Result<ControlStatus> {
        self.request(|reply| SessionRequest::Control { action, reply }).await
    }

    pub async fn pause(&self) -> Result<ControlStatus> {
        self.control(ControlAction::Pause).await
    }

    pub async fn resume(&self) -> Result<ControlStatus> {
        self.control(ControlAction::Resume).await
    }

    pub async fn stop(&self) -> Result<ControlStatus> {
        self.control(ControlAction::Stop).await
    }

    /// Stop the engine and wait for it to finish its teardown.
    pub async fn shutdown(mut self) -> Result<()> {
        if self.requests_tx.send(SessionRequest::Shutdown).await.is_err() {
            debug!("engine already stopped");
        }
        if let Some(handle) = self.handle.take() {
            handle.await.map_err(|e| SyncError::Other(e.into()))?;
        }
        Ok(())
    }

    async fn request<F>(&self, make: F) -> Result<ControlStatus>
    where
        F: FnOnce(oneshot::Sender<Result<ControlStatus>>) -> SessionRequest,
    {
        let (reply, rx) = oneshot::channel();
        self.requests_tx
            .send(make(reply))
            .await
            .map_err(|_| SyncError::SessionClosed)?;
        rx.await.map_err(|_| SyncError::SessionClosed)?
    }
}
