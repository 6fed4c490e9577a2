use crate::error::{ErrorKind, Result};
use crate::worker::{Context, UploadWorker, WorkerStats};
use crate::{Options, produce, work_queue};
use exn::ResultExt;
use s3bulk_inspect::InspectorHandle;
use s3bulk_storage::StoreHandle;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// The aggregate outcome of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files the enumerator put on the queue.
    pub discovered: u64,
    pub uploaded: u64,
    pub relocated: u64,
    pub inspect_failures: u64,
    pub upload_failures: u64,
    pub relocate_failures: u64,
    /// Workers that exited on a sentinel. Equal to the worker count unless the
    /// run was cancelled.
    pub stopped_workers: usize,
    /// The caller cancelled the run before it completed.
    pub cancelled: bool,
    pub elapsed: Duration,
}
impl RunSummary {
    pub fn failures(&self) -> u64 {
        self.inspect_failures + self.upload_failures + self.relocate_failures
    }

    fn absorb(&mut self, stats: WorkerStats) {
        self.uploaded += stats.uploaded;
        self.relocated += stats.relocated;
        self.inspect_failures += stats.inspect_failures;
        self.upload_failures += stats.upload_failures;
        self.relocate_failures += stats.relocate_failures;
        if stats.stopped {
            self.stopped_workers += 1;
        }
    }
}
impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} discovered, {} uploaded, {} relocated, {} failed (inspect {}, upload {}, relocate {}) in {:.2?}",
            self.discovered,
            self.uploaded,
            self.relocated,
            self.failures(),
            self.inspect_failures,
            self.upload_failures,
            self.relocate_failures,
            self.elapsed,
        )
    }
}

enum Finished {
    Producer(Result<u64>),
    Worker(Result<WorkerStats>),
}

/// Upload every file under `options.source_root`, relocating each uploaded
/// file into `options.dest_root`.
///
/// Starts one producer and `options.workers` workers, all sharing `store` and
/// `inspector`, and waits for every one of them to finish. Per-file failures
/// are only counted in the returned [`RunSummary`].
///
/// Cancelling `cancel` stops the run early: files already handed to a worker
/// are finished if their upload has completed, everything else stays where it
/// is, and a summary with [`cancelled`](RunSummary::cancelled) set is
/// returned.
///
/// # Errors
/// - [`ErrorKind::InvalidOptions`], [`ErrorKind::SourceRoot`] and
///   [`ErrorKind::DestRoot`] before anything starts.
/// - [`ErrorKind::Inspect`] from the first worker to fail an inspection under
///   [`InspectFailurePolicy::Abort`](crate::InspectFailurePolicy::Abort);
///   everyone else is cancelled first.
/// - [`ErrorKind::QueueClosed`] or [`ErrorKind::Participant`] if the pipeline
///   itself broke.
pub async fn run(
    options: Options,
    store: StoreHandle,
    inspector: InspectorHandle,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let started = Instant::now();
    validate(&options).await?;
    tracing::info!(
        source = %options.source_root.display(),
        dest = %options.dest_root.display(),
        workers = options.workers,
        queue_capacity = options.queue_capacity,
        store = store.name(),
        "Starting upload"
    );

    // Aborting the run shouldn't cancel the caller's token.
    let token = cancel.child_token();
    let (sender, receiver) = work_queue(options.queue_capacity);
    let workers = options.workers;
    let source_root = options.source_root.clone();
    let context = Arc::new(Context::new(store, inspector, options));

    let mut participants = JoinSet::new();
    participants.spawn({
        let token = token.clone();
        async move { Finished::Producer(produce(source_root, workers, sender, token).await) }
    });
    for id in 1..=workers {
        let worker = UploadWorker::new(id, context.clone(), receiver.clone(), token.clone());
        participants.spawn(async move { Finished::Worker(worker.run().await) });
    }
    // Workers hold their own clones; the queue must close once they're gone.
    drop(receiver);

    let mut summary = RunSummary::default();
    let mut failure = None;
    while let Some(joined) = participants.join_next().await {
        let result = match joined.or_raise(|| ErrorKind::Participant) {
            Ok(Finished::Producer(result)) => result.map(|discovered| summary.discovered = discovered),
            Ok(Finished::Worker(result)) => result.map(|stats| summary.absorb(stats)),
            Err(err) => Err(err),
        };
        if let Err(err) = result
            && failure.is_none()
        {
            tracing::error!(error = ?err, "Stopping all workers");
            token.cancel();
            failure = Some(err);
        }
    }
    if let Some(err) = failure {
        return Err(err);
    }

    summary.cancelled = cancel.is_cancelled();
    summary.elapsed = started.elapsed();
    Ok(summary)
}

async fn validate(options: &Options) -> Result<()> {
    if options.workers == 0 {
        exn::bail!(ErrorKind::InvalidOptions("at least one worker is required"));
    }
    match fs::metadata(&options.source_root).await {
        Ok(metadata) if metadata.is_dir() => {},
        _ => exn::bail!(ErrorKind::SourceRoot(options.source_root.clone())),
    }
    fs::create_dir_all(&options.dest_root).await.or_raise(|| ErrorKind::DestRoot(options.dest_root.clone()))?;
    Ok(())
}
