//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Object key is malformed (see [`validate_key`](crate::validate_key)).
    #[display("invalid object key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// Access denied (bucket policy, ACL, or credentials)
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Network-related error (connection, DNS, timeouts)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The store received the request and rejected it.
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
    /// An ACL string that isn't `private` or `public`.
    #[display("unknown ACL: {_0}")]
    UnknownAcl(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::BackendError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::InvalidKey("a//b".to_string()).to_string(), "invalid object key: a//b");
        assert_eq!(ErrorKind::UnknownAcl("world".to_string()).to_string(), "unknown ACL: world");
    }

    #[test]
    fn test_error_kind_retryable() {
        assert!(ErrorKind::Network("reset".to_string()).is_retryable());
        assert!(!ErrorKind::PermissionDenied("/key".to_string()).is_retryable());
        assert!(!ErrorKind::InvalidKey("".to_string()).is_retryable());
    }
}
