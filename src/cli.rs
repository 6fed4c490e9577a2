use clap::{ArgAction, Parser};
use s3bulk_config::Overrides;
use std::path::PathBuf;

/// Crates whose log level follows `-v`/`-q`. Everything else (the AWS SDK,
/// mostly) stays at `warn` unless `-vvv` is given.
const OWN_CRATES: [&str; 5] = ["s3bulk", "s3bulk_config", "s3bulk_inspect", "s3bulk_pipeline", "s3bulk_storage"];

/// Bulk-upload Habitat package archives to S3-compatible storage.
///
/// Every file under the source directory is inspected with `hab pkg info`,
/// uploaded under `/{origin}/{name}/{version}/{release}/x86_64/{platform}/`,
/// and then moved into the destination directory. Files that fail stay where
/// they are, so re-running picks up only what's left.
///
/// Credentials come from `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.
/// Every option can also be set in a configuration file or with an
/// `S3BULK_`-prefixed environment variable.
#[derive(Debug, Parser)]
#[command(name = "s3bulk", version, about)]
pub struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "S3BULK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bucket to upload into [default: my-s3-bucket]
    #[arg(long)]
    pub bucket: Option<String>,

    /// Key prefix placed before the package path
    #[arg(long)]
    pub subfolder: Option<String>,

    /// Number of concurrent upload workers [default: 100]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Work queue capacity; 0 hands each file straight to a worker [default: 0]
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Region [default: eu-west-1]
    #[arg(long)]
    pub region: Option<String>,

    /// Object ACL: private or public [default: private]
    #[arg(long)]
    pub acl: Option<String>,

    /// Directory to upload from [default: files/]
    #[arg(long = "sourcedir", value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Directory uploaded files are moved to [default: files-uploaded/]
    #[arg(long = "destdir", value_name = "DIR")]
    pub dest_dir: Option<PathBuf>,

    /// Endpoint URL, used with the minio backend only [default: http://localhost:9000]
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Storage backend: minio or aws [default: minio]
    #[arg(long)]
    pub backend: Option<String>,

    /// Path to the hab binary [default: searched for on PATH]
    #[arg(long = "hab", value_name = "PATH")]
    pub hab_binary: Option<PathBuf>,

    /// What to do when a file can't be inspected: skip or abort [default: skip]
    #[arg(long)]
    pub on_inspect_failure: Option<String>,

    /// More logging; repeat for more detail
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            bucket: self.bucket.clone(),
            subfolder: self.subfolder.clone(),
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            region: self.region.clone(),
            acl: self.acl.clone(),
            source_dir: self.source_dir.clone(),
            dest_dir: self.dest_dir.clone(),
            endpoint: self.endpoint.clone(),
            backend: self.backend.clone(),
            hab_binary: self.hab_binary.clone(),
            on_inspect_failure: self.on_inspect_failure.clone(),
        }
    }

    /// `EnvFilter` directives for when `RUST_LOG` isn't set.
    pub fn log_directives(&self) -> String {
        let level = match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        };
        let others = if self.verbose >= 3 { "trace" } else { "warn" };
        let mut directives = vec![others.to_string()];
        directives.extend(OWN_CRATES.iter().map(|krate| format!("{krate}={level}")));
        directives.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_command() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_original_flag_names() {
        let args = Args::try_parse_from([
            "s3bulk",
            "--bucket",
            "packages",
            "--workers",
            "4",
            "--sourcedir",
            "in",
            "--destdir",
            "out",
            "--backend",
            "aws",
            "--acl",
            "public",
        ])
        .unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.bucket.as_deref(), Some("packages"));
        assert_eq!(overrides.workers, Some(4));
        assert_eq!(overrides.source_dir, Some(PathBuf::from("in")));
        assert_eq!(overrides.dest_dir, Some(PathBuf::from("out")));
        assert_eq!(overrides.backend.as_deref(), Some("aws"));
        assert_eq!(overrides.acl.as_deref(), Some("public"));
        assert_eq!(overrides.region, None);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Args::try_parse_from(["s3bulk", "-v", "-q"]).is_err());
    }

    #[rstest]
    #[case(&["s3bulk"], "warn,s3bulk=info")]
    #[case(&["s3bulk", "-q"], "warn,s3bulk=warn")]
    #[case(&["s3bulk", "-v"], "warn,s3bulk=debug")]
    #[case(&["s3bulk", "-vv"], "warn,s3bulk=trace")]
    #[case(&["s3bulk", "-vvv"], "trace,s3bulk=trace")]
    fn test_log_directives(#[case] argv: &[&str], #[case] expected_prefix: &str) {
        let args = Args::try_parse_from(argv).unwrap();
        let directives = args.log_directives();
        assert!(directives.starts_with(expected_prefix), "{directives}");
        assert_eq!(directives.matches(',').count(), OWN_CRATES.len());
    }
}
