//! Call session management
//!
//! This module owns everything that lives for the duration of a call:
//! - `Dispatcher`: consumes ARI events and drives setup/teardown
//! - `SessionRegistry`: channel id → running worker
//! - `WorkerPool` / `CallWorker`: bounded execution of per-call workers
//! - `SessionSummary` / `WorkerStats`: reporting types

mod dispatcher;
mod registry;
mod stats;
mod worker;

pub use dispatcher::{classify, CallEvent, Dispatcher};
pub use registry::{DuplicateSession, SessionEntry, SessionRegistry};
pub use stats::{SessionSummary, WorkerStats};
pub use worker::{
    CallWorker, MediaListener, MediaListenerFactory, WorkerFactory, WorkerHandle, WorkerPool,
};
