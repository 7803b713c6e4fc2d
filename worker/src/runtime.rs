//! Worker thread and message loop.
//!
//! DESIGN
//! ======
//! The worker is a dedicated OS thread driving a current-thread tokio
//! runtime with a `LocalSet`. Its message loop handles one message at a
//! time; render requests start a local job task and immediately return to
//! the inbox. The painting uid is a plain `Rc<Cell<_>>`: the loop writes it
//! and jobs read it, interleaved on one thread, so no lock is involved.
//!
//! TRANSPORT
//! =========
//! Messages cross the thread boundary either as values (columns shared by
//! reference count) or as protobuf bytes through the `frames` codec, the
//! way they would cross a `postMessage` boundary.

#[cfg(test)]
#[path = "runtime_test.rs"]
mod runtime_test;

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;

use frames::{CodecError, Message, RenderKind, RenderTask, decode_message, encode_message};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinHandle, LocalSet, spawn_local};
use tracing::{debug, info, warn};

use crate::job::{self, Painting};
use crate::state::WorkerState;

const WORKER_THREAD_NAME: &str = "render-worker";

/// Errors from starting or talking to the render worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to build worker runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to spawn worker thread: {0}")]
    Thread(#[source] std::io::Error),
    #[error("render worker is gone")]
    Closed,
    #[error("render worker thread panicked")]
    Panicked,
    #[error("render target {0} is not registered")]
    UnknownTarget(usize),
    #[error("render geometry is not finite")]
    InvalidGeometry,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// How messages cross the main/worker boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Pass message values; columns are shared, not copied.
    #[default]
    Direct,
    /// Encode every message to protobuf bytes.
    Encoded,
}

/// One message in transit.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Message(Message),
    Encoded(Vec<u8>),
}

impl From<Message> for Packet {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

impl Packet {
    /// Wrap `message` for `transport`.
    ///
    /// # Errors
    ///
    /// Returns the codec error when encoding fails.
    pub fn pack(message: Message, transport: Transport) -> Result<Self, CodecError> {
        match transport {
            Transport::Direct => Ok(Self::Message(message)),
            Transport::Encoded => Ok(Self::Encoded(encode_message(&message)?)),
        }
    }

    /// Unwrap the message, decoding it if needed.
    ///
    /// # Errors
    ///
    /// Returns the codec error for undecodable bytes.
    pub fn open(self) -> Result<Message, CodecError> {
        match self {
            Self::Message(message) => Ok(message),
            Self::Encoded(bytes) => decode_message(&bytes),
        }
    }
}

/// Handle to a running worker thread.
#[derive(Debug)]
pub struct RenderWorker {
    inbox: Option<UnboundedSender<Packet>>,
    outbox: UnboundedReceiver<Packet>,
    transport: Transport,
    thread: Option<thread::JoinHandle<()>>,
}

impl RenderWorker {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Runtime`] or [`WorkerError::Thread`] when the
    /// runtime or the thread cannot be created.
    pub fn spawn(transport: Transport) -> Result<Self, WorkerError> {
        let (to_worker, from_main) = mpsc::unbounded_channel();
        let (to_main, from_worker) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel(1);

        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        if ready_tx.send(Err(err)).is_err() {
                            warn!("worker spawner went away before startup finished");
                        }
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }
                let local = LocalSet::new();
                local.block_on(&runtime, run(from_main, to_main, transport));
            })
            .map_err(WorkerError::Thread)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(WorkerError::Runtime(err)),
            Err(_) => return Err(WorkerError::Panicked),
        }
        info!(?transport, "render worker started");
        Ok(Self { inbox: Some(to_worker), outbox: from_worker, transport, thread: Some(thread) })
    }

    #[must_use]
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Post a message to the worker.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Closed`] when the worker has stopped, or the
    /// codec error for an unencodable message.
    pub fn send(&self, message: Message) -> Result<(), WorkerError> {
        let inbox = self.inbox.as_ref().ok_or(WorkerError::Closed)?;
        let packet = Packet::pack(message, self.transport)?;
        inbox.send(packet).map_err(|_| WorkerError::Closed)
    }

    /// Wait for the next message from the worker. `None` once it stopped.
    ///
    /// # Errors
    ///
    /// Returns the codec error for an undecodable reply.
    pub async fn recv(&mut self) -> Result<Option<Message>, WorkerError> {
        match self.outbox.recv().await {
            Some(packet) => Ok(Some(packet.open()?)),
            None => Ok(None),
        }
    }

    /// The next message if one is already waiting.
    ///
    /// # Errors
    ///
    /// Returns the codec error for an undecodable reply.
    pub fn try_recv(&mut self) -> Result<Option<Message>, WorkerError> {
        match self.outbox.try_recv() {
            Ok(packet) => Ok(Some(packet.open()?)),
            Err(_) => Ok(None),
        }
    }

    /// Close the inbox and wait for the thread to exit. Blocks until the
    /// current render, if any, has finished or been abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Panicked`] when the worker thread panicked.
    pub fn shutdown(mut self) -> Result<(), WorkerError> {
        drop(self.inbox.take());
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| WorkerError::Panicked)?;
        }
        info!("render worker stopped");
        Ok(())
    }
}

/// The worker's message loop. Must run inside a [`LocalSet`].
///
/// Returns once `inbox` is closed and the newest render has finished.
pub async fn run(mut inbox: UnboundedReceiver<Packet>, outbox: UnboundedSender<Packet>, transport: Transport) {
    let state = Rc::new(RefCell::new(WorkerState::new()));
    let painting = Painting::new();
    let mut latest: Option<JoinHandle<()>> = None;

    while let Some(packet) = inbox.recv().await {
        let message = match packet.open() {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, "dropping undecodable message");
                continue;
            }
        };
        debug!(kind = message.name(), uid = ?message.uid(), "worker message");

        match message {
            Message::Init(init) => state.borrow_mut().init(init.config),
            Message::Reset => {
                painting.abandon();
                state.borrow_mut().reset();
            }
            Message::Data(update) => state.borrow_mut().apply(update),
            Message::AddTarget { index } => {
                state.borrow_mut().add_target(index);
            }
            Message::RenderPlot(task) => {
                latest = start(task, RenderKind::Plot, &state, &painting, &outbox, transport);
            }
            Message::RenderSelection(task) => {
                latest = start(task, RenderKind::Selection, &state, &painting, &outbox, transport);
            }
            Message::Completion(done) => {
                warn!(uid = done.uid, "completion sent to the worker; ignored");
            }
        }
    }

    if let Some(job) = latest {
        if let Err(err) = job.await {
            warn!(%err, "render job failed");
        }
    }
    debug!("worker inbox closed");
}

fn start(
    task: RenderTask,
    kind: RenderKind,
    state: &Rc<RefCell<WorkerState>>,
    painting: &Painting,
    outbox: &UnboundedSender<Packet>,
    transport: Transport,
) -> Option<JoinHandle<()>> {
    painting.start(task.uid);
    let snapshot = {
        let state = state.borrow();
        if !state.has_target(task.target) {
            warn!(index = task.target, uid = task.uid, "render for unregistered target dropped");
            return None;
        }
        state.snapshot()
    };

    let (state, painting, outbox) = (Rc::clone(state), painting.clone(), outbox.clone());
    Some(spawn_local(async move {
        let Some(done) = job::render(task, kind, snapshot, painting).await else {
            return;
        };
        state.borrow_mut().store(&done);
        match Packet::pack(Message::Completion(done), transport) {
            Ok(packet) => {
                if outbox.send(packet).is_err() {
                    debug!("main side gone; completion dropped");
                }
            }
            Err(err) => warn!(%err, "failed to encode completion"),
        }
    }))
}
