//! Source tree enumeration.

use crate::FileTask;
use async_stream::stream;
use futures::Stream;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

/// Streams a [`FileTask`] for every regular file under `root`.
///
/// The walk is depth-first pre-order, visiting the entries of each directory
/// in lexical file-name order. Symbolic links are followed to classify them:
/// a link to a regular file is emitted, a link to a directory is never
/// descended into.
///
/// Nothing here fails. Entries that can't be opened or classified are
/// skipped (logged at `debug`), and a missing or unreadable root yields an
/// empty stream.
pub fn enumerate(root: impl Into<PathBuf>) -> impl Stream<Item = FileTask> + Send + 'static {
    let root = root.into();
    stream! {
        // Pending entries in reverse visiting order, so popping yields them
        // in order and a directory's children are visited before its
        // following siblings.
        let mut stack = list_sorted(&root).await;
        stack.reverse();
        while let Some(path) = stack.pop() {
            match classify(&path).await {
                Ok(WalkEntry::File(path)) => match path.strip_prefix(&root) {
                    Ok(relative) => yield FileTask::new(relative),
                    Err(_) => tracing::debug!(path = %path.display(), "Skipping path outside of source root"),
                },
                Ok(WalkEntry::Descend(dir)) => {
                    let mut children = list_sorted(&dir).await;
                    children.reverse();
                    stack.append(&mut children);
                },
                Ok(WalkEntry::Skip) => tracing::debug!(path = %path.display(), "Skipping non-regular file"),
                Err(err) => tracing::debug!(path = %path.display(), error = %err, "Skipping unreadable entry"),
            }
        }
    }
}

/// Directory entries of `dir`, sorted by file name. Unreadable directories
/// (and entries) are treated as empty.
async fn list_sorted(dir: &Path) -> Vec<PathBuf> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(path = %dir.display(), error = %err, "Skipping unreadable directory");
            return vec![];
        },
    };
    let mut paths = vec![];
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => paths.push(entry.path()),
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(path = %dir.display(), error = %err, "Stopped reading directory early");
                break;
            },
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    paths
}

async fn classify(path: &Path) -> io::Result<WalkEntry> {
    let metadata = fs::symlink_metadata(path).await?;
    let is_file = if metadata.is_symlink() {
        // Note: a broken link fails here and is skipped by the caller.
        fs::metadata(path).await?.is_file()
    } else if metadata.is_dir() {
        return Ok(WalkEntry::Descend(path.to_path_buf()));
    } else {
        metadata.is_file()
    };
    if !is_file {
        return Ok(WalkEntry::Skip);
    }
    // Files we can't open are skipped here rather than failing in a worker.
    drop(fs::File::open(path).await?);
    Ok(WalkEntry::File(path.to_path_buf()))
}
