//! The work queue between the enumerator and the upload workers.

use crate::enumerate::enumerate;
use crate::error::{ErrorKind, Result};
use crate::Task;
use async_channel::{Receiver, Sender};
use futures::StreamExt;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Create the work queue: a single ordered multi-producer, multi-consumer
/// channel in which every item is received by at most one consumer.
///
/// A `capacity` of zero asks for the tightest possible handoff. The channel
/// can't be a true rendezvous, so it gets a single slot instead.
pub fn work_queue(capacity: usize) -> (Sender<Task>, Receiver<Task>) {
    async_channel::bounded(capacity.max(1))
}

/// Walks `root` and pushes every file into the queue, then pushes exactly
/// `workers` [`Task::Stop`] sentinels and drops the sender.
///
/// Returns the number of files enqueued. On cancellation the walk stops, no
/// sentinels are sent, and the queue is closed so that idle workers wake up;
/// the count so far is still returned.
///
/// # Errors
/// [`ErrorKind::QueueClosed`] if every receiver went away first.
pub async fn produce(
    root: impl Into<PathBuf>,
    workers: usize,
    queue: Sender<Task>,
    cancel: CancellationToken,
) -> Result<u64> {
    let mut files = std::pin::pin!(enumerate(root));
    let mut enqueued = 0;
    loop {
        let task = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(close(&queue, enqueued)),
            task = files.next() => task,
        };
        let Some(task) = task else {
            break;
        };
        tracing::debug!(path = %task, "Discovered file");
        if !push(&queue, task.into(), &cancel).await? {
            return Ok(close(&queue, enqueued));
        }
        enqueued += 1;
    }
    tracing::info!(files = enqueued, "Enumeration complete");
    for _ in 0..workers {
        if !push(&queue, Task::Stop, &cancel).await? {
            return Ok(close(&queue, enqueued));
        }
    }
    Ok(enqueued)
}

/// Returns `false` if cancelled while waiting for room in the queue.
async fn push(queue: &Sender<Task>, task: Task, cancel: &CancellationToken) -> Result<bool> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Ok(false),
        sent = queue.send(task) => match sent {
            Ok(()) => Ok(true),
            // Receivers only disappear early when the run is being torn down.
            Err(_) if cancel.is_cancelled() => Ok(false),
            Err(_) => exn::bail!(ErrorKind::QueueClosed),
        },
    }
}

fn close(queue: &Sender<Task>, enqueued: u64) -> u64 {
    tracing::info!(files = enqueued, "Enumeration cancelled");
    queue.close();
    enqueued
}
