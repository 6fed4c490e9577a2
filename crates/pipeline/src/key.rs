use crate::FileTask;
use crate::error::{ErrorKind, Result};
use s3bulk_inspect::PackageMetadata;

/// Only one architecture has ever been published.
const ARCH: &str = "x86_64";

/// `windows` if the task's relative path mentions it anywhere, otherwise
/// `linux`.
pub fn platform(task: &FileTask) -> &'static str {
    if task.relative().to_string_lossy().contains("windows") { "windows" } else { "linux" }
}

/// Derive the object key for a file:
/// `/{prefix}/{origin}/{name}/{version}/{release}/x86_64/{platform}/{basename}`.
///
/// Leading and trailing separators on `prefix` are ignored, and an empty
/// prefix contributes no segment at all. Raises [`ErrorKind::Key`] if the
/// task has no file name, or one that isn't valid UTF-8.
///
/// ```
/// use s3bulk_inspect::PackageMetadata;
/// use s3bulk_pipeline::{FileTask, destination_key};
///
/// let metadata = PackageMetadata::new("core", "pkg", "1.2.0", "20230101000000");
/// let key = destination_key("", &FileTask::new("linux/pkg-1.2.0.tar"), &metadata).unwrap();
/// assert_eq!(key, "/core/pkg/1.2.0/20230101000000/x86_64/linux/pkg-1.2.0.tar");
/// ```
pub fn destination_key(prefix: &str, task: &FileTask, metadata: &PackageMetadata) -> Result<String> {
    // Non-UTF-8 names would otherwise collapse onto the same lossy key.
    let Some(basename) = task.file_name().and_then(|name| name.to_str()) else {
        exn::bail!(ErrorKind::Key(task.relative().to_path_buf()));
    };
    let mut key = String::new();
    let prefix = prefix.trim_matches('/');
    if !prefix.is_empty() {
        key.push('/');
        key.push_str(prefix);
    }
    for segment in [
        metadata.origin.as_str(),
        metadata.name.as_str(),
        metadata.version.as_str(),
        metadata.release.as_str(),
        ARCH,
        platform(task),
    ] {
        key.push('/');
        key.push_str(segment);
    }
    key.push('/');
    key.push_str(basename);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn metadata() -> PackageMetadata {
        PackageMetadata::new("core", "pkg", "1.2.0", "20230101000000")
    }

    #[rstest]
    #[case("", "linux/pkg-1.2.0.tar", "/core/pkg/1.2.0/20230101000000/x86_64/linux/pkg-1.2.0.tar")]
    #[case("", "pkg-1.2.0.tar", "/core/pkg/1.2.0/20230101000000/x86_64/linux/pkg-1.2.0.tar")]
    #[case("", "windows/pkg.hart", "/core/pkg/1.2.0/20230101000000/x86_64/windows/pkg.hart")]
    #[case("", "a/b/pkg-windows-x64.hart", "/core/pkg/1.2.0/20230101000000/x86_64/windows/pkg-windows-x64.hart")]
    #[case("", "Windows/pkg.hart", "/core/pkg/1.2.0/20230101000000/x86_64/linux/pkg.hart")]
    #[case("packages", "linux/pkg.hart", "/packages/core/pkg/1.2.0/20230101000000/x86_64/linux/pkg.hart")]
    #[case("/stable/", "linux/pkg.hart", "/stable/core/pkg/1.2.0/20230101000000/x86_64/linux/pkg.hart")]
    #[case("a/b", "pkg.hart", "/a/b/core/pkg/1.2.0/20230101000000/x86_64/linux/pkg.hart")]
    fn test_destination_key(#[case] prefix: &str, #[case] path: &str, #[case] expected: &str) {
        let key = destination_key(prefix, &FileTask::new(path), &metadata()).unwrap();
        assert_eq!(key, expected);
        assert!(s3bulk_storage::validate_key(&key).is_ok());
    }

    #[test]
    fn test_destination_key_without_file_name() {
        let err = destination_key("", &FileTask::new(""), &metadata()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Key(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_destination_key_rejects_non_utf8_file_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        use std::path::Path;

        let task = FileTask::new(Path::new("linux").join(OsStr::from_bytes(b"pkg-\xff.hart")));
        let err = destination_key("", &task, &metadata()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Key(_)));
    }
}
