//! Object key validation.
//!
//! Keys produced by the upload pipeline are POSIX-style absolute paths
//! (`/origin/name/...`). Stores refuse anything else before a request ever
//! leaves the process.

use crate::error::{ErrorKind, Result};

/// Maximum key length, in bytes, accepted by S3.
const MAX_KEY_LENGTH: usize = 1024;

/// Validates an object key.
///
/// A valid key starts with `/`, has no empty, `.` or `..` segments, contains
/// no null bytes and is at most 1024 bytes long. Keys are **not** normalized;
/// they are either accepted verbatim or rejected.
///
/// # Examples
///
/// ```
/// use s3bulk_storage::validate_key;
/// // Valid keys
/// assert!(validate_key("/core/pkg/1.2.0/20230101000000/x86_64/linux/pkg.hart").is_ok());
/// assert!(validate_key("/single").is_ok());
/// // Invalid keys
/// assert!(validate_key("core/pkg").is_err()); // (not rooted)
/// assert!(validate_key("/core//pkg").is_err());
/// assert!(validate_key("/core/../pkg").is_err());
/// assert!(validate_key("/core/pkg/").is_err());
/// ```
pub fn validate(key: &str) -> Result<&str> {
    let invalid = || ErrorKind::InvalidKey(key.to_string());
    if key.len() > MAX_KEY_LENGTH || key.contains('\0') {
        exn::bail!(invalid());
    }
    let Some(rest) = key.strip_prefix('/') else {
        exn::bail!(invalid());
    };
    for segment in rest.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            exn::bail!(invalid());
        }
    }
    Ok(key)
}
