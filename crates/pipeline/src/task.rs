use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// One file to upload, named by its path relative to the source root.
///
/// Created by the enumerator and consumed exactly once by exactly one worker.
/// Only normal path components are kept, so a task can never point outside
/// whichever root it is later joined onto.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileTask(PathBuf);
impl FileTask {
    pub fn new(relative: impl AsRef<Path>) -> Self {
        let path = relative
            .as_ref()
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        Self(path)
    }

    pub fn relative(&self) -> &Path {
        &self.0
    }

    pub fn file_name(&self) -> Option<&OsStr> {
        self.0.file_name()
    }

    /// Directory part of the task, relative to the root. Empty for files
    /// directly under the root.
    pub fn parent(&self) -> &Path {
        self.0.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Resolve the task against a root directory.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}
impl fmt::Display for FileTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.display())
    }
}

/// An item travelling through the work queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    File(FileTask),
    /// Sentinel: the worker that receives it exits and never reads the queue
    /// again. Exactly one is sent per worker once enumeration is complete.
    Stop,
}
impl From<FileTask> for Task {
    fn from(task: FileTask) -> Self {
        Self::File(task)
    }
}
