//! Command queue.
//!
//! Producers on any thread package mutations as [`Job`]s and hand them to the
//! render thread over a rendezvous channel: `send` blocks until the render
//! thread takes the job, so there is no queue depth and no cancellation.
//! Results travel back through a single-assignment [`Pending`].
//!
//! Jobs from one producer execute in submission order; jobs from different
//! producers execute in the order the render thread accepted them.

mod job;
mod pending;
mod sender;

pub use job::Job;
pub use pending::{promise, Pending, Reply};
pub use sender::{job_queue, CommandQueue, JobReceiver, ObjectHandle};
