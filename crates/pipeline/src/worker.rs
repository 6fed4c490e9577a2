use crate::error::{ErrorKind, Result};
use crate::{FileTask, InspectFailurePolicy, Options, Task, destination_key};
use async_channel::Receiver;
use exn::{OptionExt, ResultExt};
use s3bulk_inspect::InspectorHandle;
use s3bulk_storage::StoreHandle;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Read-only state shared by every worker of a run.
pub struct Context {
    pub store: StoreHandle,
    pub inspector: InspectorHandle,
    pub options: Options,
}
impl Context {
    pub fn new(store: StoreHandle, inspector: InspectorHandle, options: Options) -> Self {
        Self { store, inspector, options }
    }
}

/// Per-worker tally, handed back to the coordinator when the worker exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Tasks taken off the queue (sentinels excluded).
    pub processed: u64,
    /// Successful puts, whether or not the file could be relocated afterwards.
    pub uploaded: u64,
    pub relocated: u64,
    pub inspect_failures: u64,
    /// Read failures and rejected puts.
    pub upload_failures: u64,
    pub relocate_failures: u64,
    /// The worker exited because it received a [`Task::Stop`].
    pub stopped: bool,
}

/// A queue consumer: takes one task at a time and uploads it.
pub struct UploadWorker {
    id: usize,
    context: Arc<Context>,
    queue: Receiver<Task>,
    cancel: CancellationToken,
}

impl UploadWorker {
    /// `id` is the worker's 1-based ordinal, only used to attribute log lines.
    pub fn new(id: usize, context: Arc<Context>, queue: Receiver<Task>, cancel: CancellationToken) -> Self {
        Self { id, context, queue, cancel }
    }

    /// Consume tasks until a sentinel arrives, the queue closes, or the run is
    /// cancelled.
    ///
    /// Per-file failures are logged and counted, never returned; the single
    /// exception is an inspection failure under
    /// [`InspectFailurePolicy::Abort`].
    #[instrument(skip_all, fields(worker = self.id))]
    pub async fn run(self) -> Result<WorkerStats> {
        let mut stats = WorkerStats::default();
        loop {
            let task = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                received = self.queue.recv() => match received {
                    Ok(Task::File(task)) => task,
                    Ok(Task::Stop) => {
                        stats.stopped = true;
                        break;
                    },
                    // Closed and drained: the producer was cancelled.
                    Err(_) => break,
                },
            };
            tracing::info!(path = %task, "Processing file");
            match self.upload(&task).await {
                Ok(key) => {
                    stats.processed += 1;
                    stats.uploaded += 1;
                    stats.relocated += 1;
                    tracing::info!(path = %task, key = %key, "Uploaded and relocated");
                },
                Err(err) => match &*err {
                    // The file was left untouched; it isn't counted.
                    ErrorKind::Cancelled => break,
                    kind if !kind.is_per_file() => return Err(err),
                    ErrorKind::Inspect(_) => {
                        stats.processed += 1;
                        stats.inspect_failures += 1;
                        tracing::warn!(path = %task, error = ?err, "Could not inspect file; leaving it in place");
                        if self.context.options.on_inspect_failure == InspectFailurePolicy::Abort {
                            return Err(err);
                        }
                    },
                    ErrorKind::Relocate(_) => {
                        stats.processed += 1;
                        stats.uploaded += 1;
                        stats.relocate_failures += 1;
                        tracing::warn!(path = %task, error = ?err, "Uploaded, but could not relocate file");
                    },
                    kind => {
                        stats.processed += 1;
                        stats.upload_failures += 1;
                        tracing::warn!(
                            path = %task,
                            retryable = kind.is_retryable(),
                            error = ?err,
                            "Upload failed; leaving file in place"
                        );
                    },
                },
            }
        }
        tracing::debug!(?stats, "Worker exiting");
        Ok(stats)
    }

    /// Inspect, upload, then relocate a single file. Returns the object key.
    ///
    /// Once the put has succeeded the file is always moved, even if the run is
    /// cancelled meanwhile; a failed move never retries the upload.
    pub async fn upload(&self, task: &FileTask) -> Result<String> {
        let options = &self.context.options;
        let source = task.under(&options.source_root);
        let metadata = self
            .until_cancelled(self.context.inspector.inspect(&source))
            .await?
            .or_raise(|| ErrorKind::Inspect(source.clone()))?;
        let key = destination_key(&options.prefix, task, &metadata)?;
        // Whole file in memory: a worker holds at most one file at a time.
        let body = fs::read(&source).await.or_raise(|| ErrorKind::Read(source.clone()))?;
        let ack = self
            .until_cancelled(self.context.store.put(&key, body, options.acl))
            .await?
            .or_raise(|| ErrorKind::Upload(key.clone()))?;
        tracing::debug!(key = %key, store = self.context.store.name(), %ack, "Stored object");
        self.relocate(task).await?;
        Ok(key)
    }

    /// Move an uploaded file to the same relative path under the destination
    /// root, creating any missing directories on the way.
    async fn relocate(&self, task: &FileTask) -> Result<PathBuf> {
        let options = &self.context.options;
        let destination = task.under(&options.dest_root);
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o775);
        builder
            .create(options.dest_root.join(task.parent()))
            .await
            .or_raise(|| ErrorKind::Relocate(destination.clone()))?;
        fs::rename(task.under(&options.source_root), &destination)
            .await
            .or_raise(|| ErrorKind::Relocate(destination.clone()))?;
        Ok(destination)
    }

    async fn until_cancelled<F: Future>(&self, future: F) -> Result<F::Output> {
        self.cancel.run_until_cancelled(future).await.ok_or_raise(|| ErrorKind::Cancelled)
    }
}
