//! In-memory object store for testing.

use crate::error::{ErrorKind, Result};
use crate::models::{Acl, PutAck};
use crate::{Store, validate_key};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// In-memory object store for testing.
///
/// Objects are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Every put attempt
/// is recorded (successful or not) so tests can assert on how many times a key
/// was uploaded.
///
/// # Examples
///
/// ```
/// use s3bulk_storage::{Acl, Store, backend::MockStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MockStore::default().with_failures(["/broken/key"]);
/// assert!(store.put("/good/key", b"data".to_vec(), Acl::Private).await.is_ok());
/// assert!(store.put("/broken/key", b"data".to_vec(), Acl::Private).await.is_err());
/// assert_eq!(store.object("/good/key").await.unwrap(), b"data");
/// assert_eq!(store.attempts("/broken/key").await, 1);
/// # }
/// ```
pub struct MockStore {
    name: String,
    objects: RwLock<HashMap<String, (Acl, Vec<u8>)>>,
    attempts: RwLock<Vec<String>>,
    failures: HashSet<String>,
}

impl MockStore {
    /// Make every put to one of `keys` fail with a
    /// [`BackendError`](ErrorKind::BackendError).
    pub fn with_failures(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.failures.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Contents of a stored object.
    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).map(|(_, data)| data.clone())
    }

    /// ACL a stored object was uploaded with.
    pub async fn acl(&self, key: &str) -> Option<Acl> {
        self.objects.read().await.get(key).map(|(acl, _)| *acl)
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of put attempts made for `key`, including failed ones.
    pub async fn attempts(&self, key: &str) -> usize {
        self.attempts.read().await.iter().filter(|k| *k == key).count()
    }

    /// Total number of put attempts across all keys.
    pub async fn total_attempts(&self) -> usize {
        self.attempts.read().await.len()
    }
}
impl Default for MockStore {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            objects: RwLock::new(HashMap::new()),
            attempts: RwLock::new(Vec::new()),
            failures: HashSet::new(),
        }
    }
}

#[async_trait]
impl Store for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, key: &str, body: Vec<u8>, acl: Acl) -> Result<PutAck> {
        let key = validate_key(key)?;
        self.attempts.write().await.push(key.to_string());
        if self.failures.contains(key) {
            exn::bail!(ErrorKind::BackendError(format!("mock failure for {key}")));
        }
        let e_tag = format!("\"{:x}\"", body.len());
        self.objects.write().await.insert(key.to_string(), (acl, body));
        Ok(PutAck::new(Some(e_tag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_read_back() {
        let store = MockStore::default();
        store.put("/a/b", b"hello".to_vec(), Acl::Public).await.unwrap();
        assert_eq!(store.object("/a/b").await.unwrap(), b"hello");
        assert_eq!(store.acl("/a/b").await, Some(Acl::Public));
        assert_eq!(store.keys().await, vec!["/a/b".to_string()]);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MockStore::default();
        store.put("/same", b"first".to_vec(), Acl::Private).await.unwrap();
        store.put("/same", b"second".to_vec(), Acl::Private).await.unwrap();
        assert_eq!(store.object("/same").await.unwrap(), b"second");
        assert_eq!(store.attempts("/same").await, 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MockStore::default().with_failures(["/fails"]);
        let err = store.put("/fails", b"x".to_vec(), Acl::Private).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BackendError(_)));
        assert!(store.object("/fails").await.is_none());
        assert_eq!(store.attempts("/fails").await, 1);
    }

    #[tokio::test]
    async fn test_invalid_key_not_recorded() {
        let store = MockStore::default();
        assert!(store.put("relative", Vec::new(), Acl::Private).await.is_err());
        assert_eq!(store.total_attempts().await, 0);
    }
}
