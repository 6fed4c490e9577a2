//! Store trait and implementations.
//!
//! This module defines the [`Store`] trait, the single capability the upload
//! pipeline needs from object storage: put some bytes under a key.
//!

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "mock")]
pub use self::mock::MockStore;
#[cfg(feature = "s3")]
pub use self::s3::S3Store;
use crate::error::Result;
use crate::models::{Acl, PutAck};
use async_trait::async_trait;

/// Unified interface for object stores.
///
/// Implementations must be safe to share between workers: the pipeline holds
/// a single [`StoreHandle`](crate::StoreHandle) and calls [`put`](Self::put)
/// from many tasks at once.
///
/// # Keys
/// Keys are POSIX-style paths beginning with `/` and must pass
/// [`validate_key`](crate::validate_key). Implementations should enforce
/// this validation.
///
/// # Examples
///
/// ```
/// use s3bulk_storage::{Acl, PutAck, Store, error::Result};
///
/// async fn upload_readme(store: &dyn Store) -> Result<PutAck> {
///     let body = b"# Hello".to_vec();
///     store.put("/docs/README.md", body, Acl::Public).await
/// }
/// ```
#[async_trait]
pub trait Store: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// Upload `body` under `key` with the given [`Acl`].
    ///
    /// The whole object is handed over in memory. An existing object under
    /// the same key is overwritten.
    ///
    /// # Errors
    /// - [`InvalidKey`](crate::error::ErrorKind::InvalidKey) if the key fails
    ///   validation; nothing is sent.
    /// - Any other [`ErrorKind`](crate::error::ErrorKind) if the store
    ///   failed or rejected the request.
    async fn put(&self, key: &str, body: Vec<u8>, acl: Acl) -> Result<PutAck>;
}
