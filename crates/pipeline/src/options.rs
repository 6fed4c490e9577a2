use s3bulk_storage::Acl;
use std::fmt;
use std::path::PathBuf;

/// What a worker does when package metadata can't be extracted from a file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InspectFailurePolicy {
    /// Report the file, leave it where it is, and move on.
    #[default]
    Skip,
    /// Stop the whole run with an error.
    Abort,
}
impl fmt::Display for InspectFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip",
            Self::Abort => "abort",
        })
    }
}

/// Everything the pipeline needs to know about a run, besides the store and
/// the inspector.
#[derive(Clone, Debug)]
pub struct Options {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub workers: usize,
    /// Tuning knob only. Zero means the tightest handoff the queue supports.
    pub queue_capacity: usize,
    pub acl: Acl,
    /// Extra leading key segment(s); empty for none.
    pub prefix: String,
    pub on_inspect_failure: InspectFailurePolicy,
}
impl Options {
    pub const DEFAULT_WORKERS: usize = 100;

    pub fn new(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            workers: Self::DEFAULT_WORKERS,
            queue_capacity: 0,
            acl: Acl::default(),
            prefix: String::new(),
            on_inspect_failure: InspectFailurePolicy::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_acl(mut self, acl: Acl) -> Self {
        self.acl = acl;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_inspect_failure_policy(mut self, policy: InspectFailurePolicy) -> Self {
        self.on_inspect_failure = policy;
        self
    }
}
