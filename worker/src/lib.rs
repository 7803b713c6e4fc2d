//! Off-main-thread renderer for the point-cloud engine.
//!
//! The worker runs on its own thread with a single-threaded tokio runtime.
//! It keeps copies of the dataset columns and one set of recorded layers
//! per registered target, and answers `plot` / `sele` requests with
//! [`frames::Completion`]s. On the main side, [`client::RenderClient`]
//! issues task uids and keeps only the newest completion.

pub mod client;
pub mod job;
pub mod runtime;
pub mod state;

pub use client::{Pending, RenderClient, TaskTracker};
pub use runtime::{Packet, RenderWorker, Transport, WorkerError};
