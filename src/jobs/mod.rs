//! Job Backend
//!
//! The data the dashboard monitors: queues, worker pools, worker
//! observations and the retry, scheduled and dead job sets.
//!
//! - **types**: wire-format records
//! - **store**: the [`JobBackend`] trait and an in-memory implementation
//! - **error**: error types

pub mod error;
pub mod store;
pub mod types;

pub use error::{JobError, JobResult};
pub use store::{JobBackend, MemoryJobStore, StoreSnapshot, PAGE_SIZE};
pub use types::{
    DeadJob, Job, Page, Queue, RetryJob, ScheduledJob, WorkerObservation, WorkerPoolHeartbeat,
};
