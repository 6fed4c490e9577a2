//! Bulk upload pipeline.
//!
//! One producer walks the source tree and feeds a bounded [work
//! queue](work_queue); a fixed pool of [`UploadWorker`]s drains it. Each
//! worker inspects a file for its package metadata, derives the object key,
//! puts the file into the store, and finally moves it into the destination
//! tree. Shutdown is driven by sentinels: once the walk is complete the
//! producer sends exactly one [`Task::Stop`] per worker.
//!
//! The primary entry point is [`run`], which wires everything together and
//! waits for the producer and every worker to finish.

mod coordinator;
mod enumerate;
pub mod error;
mod key;
mod options;
mod queue;
mod task;
mod worker;

pub use crate::coordinator::{RunSummary, run};
pub use crate::enumerate::enumerate;
pub use crate::key::{destination_key, platform};
pub use crate::options::{InspectFailurePolicy, Options};
pub use crate::queue::{produce, work_queue};
pub use crate::task::{FileTask, Task};
pub use crate::worker::{Context, UploadWorker, WorkerStats};
