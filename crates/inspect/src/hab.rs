use crate::error::{ErrorKind, Result};
use crate::{Inspector, PackageMetadata};
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::instrument;

/// Extracts package metadata by running `hab pkg info -j <archive>`.
///
/// Each call spawns one process and waits for it, so its latency sits
/// directly on the critical path of every upload.
#[derive(Clone, Debug)]
pub struct HabInspector {
    binary: PathBuf,
}
impl HabInspector {
    /// Locate `hab` on the `PATH`.
    pub fn discover() -> Result<Self> {
        match which::which("hab") {
            Ok(binary) => {
                tracing::debug!(hab = %binary.display(), "Discovered hab CLI on system");
                Ok(Self { binary })
            },
            Err(_) => {
                tracing::info!("hab executable not found in PATH");
                exn::bail!(ErrorKind::ToolNotFound);
            },
        }
    }

    /// Use an explicit `hab` binary instead of searching the `PATH`.
    pub fn with_binary(binary: impl AsRef<Path>) -> Result<Self> {
        // `which` checks paths containing a separator directly, and confirms
        // the file is executable.
        let binary = which::which(binary.as_ref()).or_raise(|| ErrorKind::ToolNotFound)?;
        Ok(Self { binary })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl Inspector for HabInspector {
    #[instrument(skip_all, fields(path = %path.display()))]
    async fn inspect(&self, path: &Path) -> Result<PackageMetadata> {
        let output = Command::new(&self.binary)
            .args(["pkg", "info", "-j"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .or_raise(|| ErrorKind::Spawn(self.binary.clone()))?;
        if !output.status.success() {
            exn::bail!(ErrorKind::ToolFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let metadata =
            PackageMetadata::from_json(&output.stdout).or_raise(|| ErrorKind::InvalidOutput(path.to_path_buf()))?;
        metadata.validate()
    }
}
