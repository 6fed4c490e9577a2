//! Deterministic inspector for testing.

use crate::error::{ErrorKind, Result};
use crate::{Inspector, PackageMetadata};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Answers [`inspect`](Inspector::inspect) from an in-memory table keyed by
/// file name, without touching the filesystem.
///
/// Files with no entry get metadata derived from their file stem
/// (`origin = "test"`, `name = <stem>`, version `1.0.0`, release
/// `20230101000000`), so every file has distinct, predictable metadata unless
/// a test says otherwise.
///
/// # Examples
///
/// ```
/// use s3bulk_inspect::{Inspector, PackageMetadata, StaticInspector};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let inspector = StaticInspector::default()
///     .with_entry("pkg.hart", PackageMetadata::new("core", "pkg", "1.2.0", "20230101000000"))
///     .with_failures(["corrupt.hart"]);
/// let metadata = inspector.inspect(Path::new("/src/linux/pkg.hart")).await.unwrap();
/// assert_eq!(metadata.origin, "core");
/// assert!(inspector.inspect(Path::new("/src/corrupt.hart")).await.is_err());
/// # }
/// ```
#[derive(Default)]
pub struct StaticInspector {
    entries: HashMap<String, PackageMetadata>,
    failures: HashSet<String>,
    calls: AtomicUsize,
}
impl StaticInspector {
    pub fn with_entry(mut self, file_name: impl Into<String>, metadata: PackageMetadata) -> Self {
        self.entries.insert(file_name.into(), metadata);
        self
    }

    /// Make inspection of any of these file names fail like a corrupt archive.
    pub fn with_failures(mut self, file_names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.failures.extend(file_names.into_iter().map(Into::into));
        self
    }

    /// Number of times [`inspect`](Inspector::inspect) has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Inspector for StaticInspector {
    async fn inspect(&self, path: &Path) -> Result<PackageMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if self.failures.contains(&file_name) {
            exn::bail!(ErrorKind::ToolFailed {
                code: Some(1),
                stderr: format!("{file_name}: not a package archive"),
            });
        }
        let metadata = match self.entries.get(&file_name) {
            Some(metadata) => metadata.clone(),
            None => {
                let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
                PackageMetadata::new("test", stem, "1.0.0", "20230101000000")
            },
        };
        metadata.validate()
    }
}
