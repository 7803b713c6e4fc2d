//! Main-side task tracking.
//!
//! Every render request gets the next uid. A completion is accepted only
//! when it carries the uid of the newest request for its target; anything
//! older, and uid `0`, is stale and dropped.
//!
//! The worker paints one task at a time, so a new request cancels the
//! outstanding one, whatever its target. Two rules keep every target's
//! layers current:
//!
//! - a selection request made while a plot for the same target is still
//!   outstanding is sent as a plot;
//! - once a completion is accepted, a request for another target that was
//!   issued before it and never answered was cancelled by the worker, and
//!   is sent again.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::collections::{BTreeMap, BTreeSet};

use canvas::config::RenderConfig;
use canvas::engine::Layer;
use frames::{Completion, DataUpdate, Geometry, Message, RenderKind, RenderTask, Uid, WorkerInit};
use tracing::{debug, warn};

use crate::runtime::{RenderWorker, Transport, WorkerError};

/// An outstanding request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pending {
    pub uid: Uid,
    pub target: usize,
    pub kind: RenderKind,
    pub geometry: Geometry,
}

/// Uid allocation and staleness checks, per target.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTracker {
    next_uid: Uid,
    pending: BTreeMap<usize, Pending>,
    accepted: u64,
    stale: u64,
}

impl Default for TaskTracker {
    fn default() -> Self {
        Self { next_uid: 1, pending: BTreeMap::new(), accepted: 0, stale: 0 }
    }
}

impl TaskTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next request for `target`, superseding the pending one
    /// for the same target.
    pub fn issue(&mut self, target: usize, kind: RenderKind, geometry: Geometry) -> Pending {
        let previous = self.pending.get(&target).copied();
        let kind = match previous {
            Some(p) if p.kind == RenderKind::Plot => RenderKind::Plot,
            _ => kind,
        };
        if let Some(p) = previous {
            debug!(superseded = p.uid, target, "pending render superseded");
        }
        let pending = Pending { uid: self.next_uid, target, kind, geometry };
        self.next_uid = self.next_uid.saturating_add(1);
        self.pending.insert(target, pending);
        pending
    }

    /// Whether `done` answers the newest request for its target. Accepting
    /// clears that request.
    pub fn accept(&mut self, done: &Completion) -> bool {
        let fresh = done.uid != 0 && self.pending.get(&done.target).is_some_and(|p| p.uid == done.uid);
        if fresh {
            self.pending.remove(&done.target);
            self.accepted += 1;
        } else {
            self.stale += 1;
            debug!(uid = done.uid, target = done.target, latest = self.latest_uid(), "stale completion dropped");
        }
        fresh
    }

    /// The oldest request issued before `uid` that is still unanswered.
    ///
    /// Completions arrive in the order the worker finished them, so once
    /// `uid` has been accepted such a request was cancelled and never will be.
    #[must_use]
    pub fn cancelled_before(&self, uid: Uid) -> Option<Pending> {
        self.pending.values().filter(|p| p.uid < uid).min_by_key(|p| p.uid).copied()
    }

    /// Forget every pending request, e.g. after a reset.
    pub fn forget(&mut self) {
        self.pending.clear();
    }

    /// The pending request for `target`.
    #[must_use]
    pub fn pending(&self, target: usize) -> Option<Pending> {
        self.pending.get(&target).copied()
    }

    /// Whether no request is outstanding on any target.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The most recently issued uid; `0` before the first request.
    #[must_use]
    pub fn latest_uid(&self) -> Uid {
        self.next_uid - 1
    }

    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    #[must_use]
    pub fn stale(&self) -> u64 {
        self.stale
    }
}

/// A render worker plus the main-side bookkeeping for it.
#[derive(Debug)]
pub struct RenderClient {
    worker: RenderWorker,
    tracker: TaskTracker,
    targets: BTreeSet<usize>,
}

impl RenderClient {
    /// Start a worker and send it `config`.
    ///
    /// # Errors
    ///
    /// Returns the worker error when the thread cannot start.
    pub fn spawn(config: RenderConfig, transport: Transport) -> Result<Self, WorkerError> {
        let worker = RenderWorker::spawn(transport)?;
        worker.send(Message::Init(WorkerInit { config }))?;
        Ok(Self { worker, tracker: TaskTracker::new(), targets: BTreeSet::new() })
    }

    #[must_use]
    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Register a target's layers with the worker.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] when the worker stopped.
    pub fn add_target(&mut self, index: usize) -> Result<(), WorkerError> {
        self.worker.send(Message::AddTarget { index })?;
        self.targets.insert(index);
        Ok(())
    }

    /// Send new columns or masks.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] when the worker stopped.
    pub fn send_data(&self, update: DataUpdate) -> Result<(), WorkerError> {
        if update.is_empty() {
            return Ok(());
        }
        self.worker.send(Message::Data(update))
    }

    /// Clear everything the worker holds, targets included, and forget
    /// every pending render.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] when the worker stopped.
    pub fn reset(&mut self) -> Result<(), WorkerError> {
        self.tracker.forget();
        self.targets.clear();
        self.worker.send(Message::Reset)
    }

    /// Request a render and return what was actually sent.
    ///
    /// The worker would drop a task for an unregistered target or with an
    /// unusable geometry without answering, so those are refused here.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::UnknownTarget`] for a target not added since
    /// the last reset, [`WorkerError::InvalidGeometry`] for a non-finite or
    /// negative geometry, and [`WorkerError::Closed`] when the worker stopped.
    pub fn request(&mut self, target: usize, kind: RenderKind, geometry: Geometry) -> Result<Pending, WorkerError> {
        if !self.targets.contains(&target) {
            return Err(WorkerError::UnknownTarget(target));
        }
        if !geometry.is_valid() {
            return Err(WorkerError::InvalidGeometry);
        }
        let pending = self.tracker.issue(target, kind, geometry);
        self.send_task(pending)?;
        Ok(pending)
    }

    fn send_task(&self, pending: Pending) -> Result<(), WorkerError> {
        let task = RenderTask { uid: pending.uid, target: pending.target, geometry: pending.geometry };
        let message = match pending.kind {
            RenderKind::Plot => Message::RenderPlot(task),
            RenderKind::Selection => Message::RenderSelection(task),
        };
        self.worker.send(message)
    }

    /// Request the redraw an engine action asked for.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] when the worker stopped.
    pub fn request_layer(&mut self, target: usize, layer: Layer, geometry: Geometry) -> Result<Pending, WorkerError> {
        self.request(target, RenderKind::from(layer), geometry)
    }

    /// Wait for the next accepted completion on any target. Stale
    /// completions are skipped. `None` when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] when the worker stopped first.
    pub async fn next_frame(&mut self) -> Result<Option<Completion>, WorkerError> {
        while !self.tracker.is_idle() {
            match self.worker.recv().await? {
                Some(message) => {
                    if let Some(done) = self.filter(message)? {
                        return Ok(Some(done));
                    }
                }
                None => return Err(WorkerError::Closed),
            }
        }
        Ok(None)
    }

    /// The accepted completion among the messages already waiting, if any.
    ///
    /// # Errors
    ///
    /// Returns the codec error for an undecodable reply.
    pub fn poll_frame(&mut self) -> Result<Option<Completion>, WorkerError> {
        while let Some(message) = self.worker.try_recv()? {
            if let Some(done) = self.filter(message)? {
                return Ok(Some(done));
            }
        }
        Ok(None)
    }

    /// Stop the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Panicked`] when the worker thread panicked.
    pub fn shutdown(self) -> Result<(), WorkerError> {
        self.worker.shutdown()
    }

    /// Accept or drop one reply, resending a request it proves was cancelled.
    fn filter(&mut self, message: Message) -> Result<Option<Completion>, WorkerError> {
        let done = match message {
            Message::Completion(done) => done,
            other => {
                warn!(kind = other.name(), "unexpected message from worker");
                return Ok(None);
            }
        };
        if !self.tracker.accept(&done) {
            return Ok(None);
        }
        if let Some(lost) = self.tracker.cancelled_before(done.uid) {
            let retry = self.tracker.issue(lost.target, lost.kind, lost.geometry);
            debug!(cancelled = lost.uid, uid = retry.uid, target = lost.target, "cancelled render resent");
            self.send_task(retry)?;
        }
        Ok(Some(done))
    }
}
