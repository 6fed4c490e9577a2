//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An explicitly requested configuration file doesn't exist.
    #[display("configuration file {} not found", _0.display())]
    MissingFile(#[error(not(source))] PathBuf),
    /// A source (file, environment, flags) couldn't be merged or extracted.
    #[display("could not load configuration: {_0}")]
    Load(#[error(not(source))] String),
    #[display("invalid `{field}`: {reason}")]
    Invalid {
        #[error(not(source))]
        field: &'static str,
        #[error(not(source))]
        reason: &'static str,
    },
}
