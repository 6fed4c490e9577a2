pub mod error;
mod hab;
#[cfg(feature = "mock")]
mod mock;
mod models;

pub use crate::hab::HabInspector;
#[cfg(feature = "mock")]
pub use crate::mock::StaticInspector;
pub use crate::models::PackageMetadata;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub type InspectorHandle = Arc<dyn Inspector + Send + Sync>;

/// Reads the [`PackageMetadata`] embedded in a package archive.
///
/// Invoked once per file, on whichever worker picked the file up. There's no
/// caching: every upload attempt inspects the archive afresh.
#[async_trait]
pub trait Inspector: Send + Sync {
    async fn inspect(&self, path: &Path) -> Result<PackageMetadata>;
}
