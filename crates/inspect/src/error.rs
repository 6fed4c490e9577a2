//! Inspect Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An inspect error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for inspect operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("hab CLI not detected on your system")]
    ToolNotFound,
    /// The tool could not be started at all.
    #[display("failed to execute {}", _0.display())]
    Spawn(#[error(not(source))] PathBuf),
    /// The tool exited with a non-zero exit code.
    /// If there is no exit code, the tool was killed by a signal.
    #[display("hab exited with code {code:?}: {stderr}")]
    ToolFailed {
        code: Option<i32>,
        #[error(not(source))]
        stderr: String,
    },
    /// The tool succeeded but didn't print the JSON we expected.
    #[display("unparseable package info for {}", _0.display())]
    InvalidOutput(#[error(not(source))] PathBuf),
    /// A metadata field is empty or would break out of its key segment.
    #[display("invalid package metadata field `{_0}`")]
    InvalidMetadata(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Spawn(_))
    }
}
