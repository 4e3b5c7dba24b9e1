use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use livesync::api::{ApiFuture, LiveApi, Snapshot};
use livesync::errors::{Result, SyncError};
use livesync::types::{ControlAction, ExecutionId};

/// A fake `LiveApi` that:
/// - answers snapshot fetches from a queue of scripted results, falling back
///   to a fixed snapshot once the queue is empty
/// - records every control action it receives
/// - accepts control actions unless a failure was scripted for the next one
pub struct FakeApi {
    snapshot: Mutex<Snapshot>,
    scripted: Mutex<VecDeque<Result<Snapshot>>>,
    control_failures: Mutex<VecDeque<SyncError>>,
    controls: Mutex<Vec<(ExecutionId, ControlAction)>>,
    fetches: AtomicUsize,
}

impl FakeApi {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            scripted: Mutex::new(VecDeque::new()),
            control_failures: Mutex::new(VecDeque::new()),
            controls: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Replace the snapshot returned once the scripted queue is empty.
    pub fn set_snapshot(&self, snapshot: Snapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    /// Queue a one-off result for the next fetch.
    pub fn push_fetch(&self, result: Result<Snapshot>) {
        self.scripted.lock().unwrap().push_back(result);
    }

    /// Make the next control action fail with `error`.
    pub fn fail_next_control(&self, error: SyncError) {
        self.control_failures.lock().unwrap().push_back(error);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn controls(&self) -> Vec<ControlAction> {
        self.controls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, action)| *action)
            .collect()
    }

    pub fn controlled_ids(&self) -> Vec<ExecutionId> {
        self.controls
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl LiveApi for FakeApi {
    fn fetch_snapshot<'a>(&'a self, _execution_id: &'a ExecutionId) -> ApiFuture<'a, Snapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let result = match self.scripted.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(self.snapshot.lock().unwrap().clone()),
        };
        Box::pin(async move { result })
    }

    fn send_control<'a>(
        &'a self,
        execution_id: &'a ExecutionId,
        action: ControlAction,
    ) -> ApiFuture<'a, ()> {
        self.controls
            .lock()
            .unwrap()
            .push((execution_id.clone(), action));
        let result = match self.control_failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        };
        Box::pin(async move { result })
    }
}
