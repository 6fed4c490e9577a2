//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Per-file failures (inspect, read,
//! upload, relocate) are raised by a worker and normally only reported; the
//! remaining variants abort the whole run.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a pipeline failure.
///
/// ### Per-file Errors
/// - [`ErrorKind::Inspect`]
/// - [`ErrorKind::Key`]
/// - [`ErrorKind::Read`]
/// - [`ErrorKind::Upload`]
/// - [`ErrorKind::Relocate`] - the object is already in the store.
///
/// ### Run Errors
/// - [`ErrorKind::InvalidOptions`]
/// - [`ErrorKind::SourceRoot`]
/// - [`ErrorKind::DestRoot`]
/// - [`ErrorKind::QueueClosed`]
/// - [`ErrorKind::Participant`]
/// - [`ErrorKind::Cancelled`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid options: {_0}")]
    InvalidOptions(#[error(not(source))] &'static str),
    #[display("source directory {} does not exist or is not a directory", _0.display())]
    SourceRoot(#[error(not(source))] PathBuf),
    #[display("could not create destination directory {}", _0.display())]
    DestRoot(#[error(not(source))] PathBuf),
    /// Package metadata could not be extracted from the file.
    #[display("failed to inspect {}", _0.display())]
    Inspect(#[error(not(source))] PathBuf),
    /// The task has no file name to end its key with.
    #[display("cannot derive an object key for {}", _0.display())]
    Key(#[error(not(source))] PathBuf),
    #[display("failed to read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    #[display("failed to upload {_0}")]
    Upload(#[error(not(source))] String),
    /// Uploaded, but the file could not be moved into the destination tree.
    #[display("failed to relocate {}", _0.display())]
    Relocate(#[error(not(source))] PathBuf),
    /// Every consumer went away while files were still being enqueued.
    #[display("work queue closed unexpectedly")]
    QueueClosed,
    /// A producer or worker task panicked or was aborted.
    #[display("pipeline task did not complete")]
    Participant,
    #[display("operation cancelled")]
    Cancelled,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Upload(_) | Self::Relocate(_))
    }

    /// Returns `true` if the error concerns a single file, and the run can
    /// carry on with the next one.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::Inspect(_) | Self::Key(_) | Self::Read(_) | Self::Upload(_) | Self::Relocate(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Inspect(PathBuf::from("a")), true, false)]
    #[case(ErrorKind::Key(PathBuf::from("a")), true, false)]
    #[case(ErrorKind::Read(PathBuf::from("a")), true, true)]
    #[case(ErrorKind::Upload("/a".into()), true, true)]
    #[case(ErrorKind::Relocate(PathBuf::from("a")), true, true)]
    #[case(ErrorKind::QueueClosed, false, false)]
    #[case(ErrorKind::Cancelled, false, false)]
    #[case(ErrorKind::InvalidOptions("workers"), false, false)]
    fn test_classification(#[case] kind: ErrorKind, #[case] per_file: bool, #[case] retryable: bool) {
        assert_eq!(kind.is_per_file(), per_file);
        assert_eq!(kind.is_retryable(), retryable);
    }
}
