//! Layered configuration for the `s3bulk` binary.
//!
//! Sources are merged lowest to highest precedence:
//!
//! 1. built-in defaults,
//! 2. a configuration file (TOML, YAML or JSON, picked by extension),
//! 3. `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`,
//! 4. environment variables prefixed `S3BULK_` (`S3BULK_WORKERS=8`),
//! 5. command-line [`Overrides`].

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use s3bulk_pipeline::{InspectFailurePolicy, Options};
use s3bulk_storage::Acl;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "S3BULK_";

/// Which flavour of S3-compatible service to talk to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Self-hosted clone reached through the configured endpoint.
    #[default]
    Minio,
    /// AWS itself; the endpoint setting is ignored.
    Aws,
}
impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Minio => "minio",
            Self::Aws => "aws",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bucket: String,
    /// Extra leading segment(s) for every object key.
    pub subfolder: String,
    pub workers: usize,
    pub queue_capacity: usize,
    pub region: String,
    pub acl: Acl,
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub endpoint: String,
    pub backend: Backend,
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    /// Explicit `hab` binary; searched for on the `PATH` when unset.
    pub hab_binary: Option<PathBuf>,
    pub on_inspect_failure: InspectFailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket: "my-s3-bucket".into(),
            subfolder: String::new(),
            workers: Options::DEFAULT_WORKERS,
            queue_capacity: 0,
            region: "eu-west-1".into(),
            acl: Acl::Private,
            source_dir: PathBuf::from("files/"),
            dest_dir: PathBuf::from("files-uploaded/"),
            endpoint: "http://localhost:9000".into(),
            backend: Backend::Minio,
            key_id: None,
            key_secret: None,
            hab_binary: None,
            on_inspect_failure: InspectFailurePolicy::Skip,
        }
    }
}

/// Values given on the command line. Anything left as `None` falls through to
/// the lower layers.
///
/// Enumerated settings are kept as strings and parsed along with every other
/// layer, so a bad value reads the same wherever it came from.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfolder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hab_binary: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_inspect_failure: Option<String>,
}

impl Config {
    /// `config.toml` in the platform's configuration directory, if it exists.
    pub fn default_file() -> Option<PathBuf> {
        let path = ProjectDirs::from("", "", "s3bulk")?.config_dir().join("config.toml");
        path.is_file().then_some(path)
    }

    /// Every layer merged, but not yet extracted.
    pub fn figment(file: Option<&Path>, overrides: &Overrides) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = file {
            figment = match path.extension().and_then(OsStr::to_str) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        figment
            .merge(Env::raw().only(&["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"]).map(|key| {
                match key.as_str().eq_ignore_ascii_case("AWS_ACCESS_KEY_ID") {
                    true => "key_id".into(),
                    false => "key_secret".into(),
                }
            }))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    /// Load and [validate](Self::validate) the configuration.
    ///
    /// # Errors
    /// - [`ErrorKind::MissingFile`] if `file` is given but doesn't exist.
    /// - [`ErrorKind::Load`] if a layer holds a value of the wrong type.
    /// - [`ErrorKind::Invalid`] if the merged result doesn't validate.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        if let Some(path) = file {
            if !path.is_file() {
                exn::bail!(ErrorKind::MissingFile(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "Loading configuration file");
        }
        let config: Self = Self::figment(file, overrides)
            .extract()
            .map_err(|err| exn::Exn::from(ErrorKind::Load(err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            exn::bail!(ErrorKind::Invalid {
                field: "workers",
                reason: "at least one worker is required",
            });
        }
        if self.bucket.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid {
                field: "bucket",
                reason: "must not be empty",
            });
        }
        if self.source_dir == self.dest_dir {
            exn::bail!(ErrorKind::Invalid {
                field: "dest_dir",
                reason: "must differ from source_dir",
            });
        }
        if self.backend == Backend::Minio && self.endpoint.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid {
                field: "endpoint",
                reason: "required for the minio backend",
            });
        }
        Ok(())
    }

    /// The custom endpoint, which only applies to [`Backend::Minio`].
    pub fn endpoint(&self) -> Option<&str> {
        match self.backend {
            Backend::Minio => Some(&self.endpoint),
            Backend::Aws => None,
        }
    }

    /// Access key ID and secret, both of which must be set.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let Some(key_id) = self.key_id.as_deref() else {
            exn::bail!(ErrorKind::Invalid {
                field: "key_id",
                reason: "not set (export AWS_ACCESS_KEY_ID)",
            });
        };
        let Some(key_secret) = self.key_secret.as_deref() else {
            exn::bail!(ErrorKind::Invalid {
                field: "key_secret",
                reason: "not set (export AWS_SECRET_ACCESS_KEY)",
            });
        };
        Ok((key_id, key_secret))
    }

    pub fn pipeline_options(&self) -> Options {
        Options::new(&self.source_dir, &self.dest_dir)
            .with_workers(self.workers)
            .with_queue_capacity(self.queue_capacity)
            .with_acl(self.acl)
            .with_prefix(&self.subfolder)
            .with_inspect_failure_policy(self.on_inspect_failure)
    }
}

/// One line, credentials redacted. Suitable for logging.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = |value: &Option<String>| if value.is_some() { "<redacted>" } else { "<unset>" };
        write!(
            f,
            "bucket={} subfolder={:?} workers={} queue_capacity={} region={} acl={} source_dir={} dest_dir={} \
             backend={} endpoint={} key_id={} key_secret={} hab={} on_inspect_failure={}",
            self.bucket,
            self.subfolder,
            self.workers,
            self.queue_capacity,
            self.region,
            self.acl,
            self.source_dir.display(),
            self.dest_dir.display(),
            self.backend,
            self.endpoint().unwrap_or("<default>"),
            set(&self.key_id),
            set(&self.key_secret),
            self.hab_binary.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "<PATH>".into()),
            self.on_inspect_failure,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    fn load(jail: &Jail, file: Option<&str>, overrides: &Overrides) -> Result<Config> {
        Config::load(file.map(|f| jail.directory().join(f)).as_deref(), overrides)
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = load(jail, None, &Overrides::default()).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.workers, 100);
            assert_eq!(config.endpoint(), Some("http://localhost:9000"));
            Ok(())
        });
    }

    #[test]
    fn test_layer_precedence() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "s3bulk.toml",
                r#"
                bucket = "from-file"
                workers = 8
                region = "us-east-1"
                acl = "public-read"
                subfolder = "stable"
                "#,
            )?;
            jail.set_env("S3BULK_WORKERS", "16");
            jail.set_env("S3BULK_REGION", "eu-central-1");
            jail.set_env("AWS_ACCESS_KEY_ID", "id");
            jail.set_env("AWS_SECRET_ACCESS_KEY", "secret");
            let overrides = Overrides {
                region: Some("ap-south-1".into()),
                on_inspect_failure: Some("abort".into()),
                ..Default::default()
            };

            let config = load(jail, Some("s3bulk.toml"), &overrides).unwrap();

            assert_eq!(config.bucket, "from-file");
            assert_eq!(config.subfolder, "stable");
            assert_eq!(config.workers, 16);
            assert_eq!(config.region, "ap-south-1");
            assert_eq!(config.acl, Acl::Public);
            assert_eq!(config.on_inspect_failure, InspectFailurePolicy::Abort);
            assert_eq!(config.credentials().unwrap(), ("id", "secret"));
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_beats_aws_env() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("AWS_ACCESS_KEY_ID", "aws");
            jail.set_env("S3BULK_KEY_ID", "s3bulk");
            let config = load(jail, None, &Overrides::default()).unwrap();
            assert_eq!(config.key_id.as_deref(), Some("s3bulk"));
            assert!(config.credentials().is_err());
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file_and_aws_backend() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("s3bulk.yaml", "backend: aws\nsource_dir: in\ndest_dir: out\nqueue_capacity: 32\n")?;
            let config = load(jail, Some("s3bulk.yaml"), &Overrides::default()).unwrap();
            assert_eq!(config.backend, Backend::Aws);
            assert_eq!(config.endpoint(), None);
            assert_eq!(config.queue_capacity, 32);
            assert_eq!(config.source_dir, PathBuf::from("in"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        Jail::expect_with(|jail| {
            let err = load(jail, Some("nope.toml"), &Overrides::default()).unwrap_err();
            assert!(matches!(&*err, ErrorKind::MissingFile(_)));
            Ok(())
        });
    }

    #[rstest]
    #[case::unknown_acl(Overrides { acl: Some("world-writable".into()), ..Default::default() })]
    #[case::unknown_backend(Overrides { backend: Some("gcs".into()), ..Default::default() })]
    #[case::unknown_policy(Overrides { on_inspect_failure: Some("retry".into()), ..Default::default() })]
    fn test_unparseable_values(#[case] overrides: Overrides) {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let err = load(jail, None, &overrides).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load(_)));
            Ok(())
        });
    }

    #[rstest]
    #[case(Config { workers: 0, ..Default::default() }, "workers")]
    #[case(Config { bucket: " ".into(), ..Default::default() }, "bucket")]
    #[case(Config { dest_dir: "files".into(), ..Default::default() }, "dest_dir")]
    #[case(Config { endpoint: String::new(), ..Default::default() }, "endpoint")]
    fn test_validate(#[case] config: Config, #[case] expected: &str) {
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid { field, .. } if *field == expected));
    }

    #[test]
    fn test_display_redacts_secrets() {
        let config = Config {
            key_id: Some("AKIAEXAMPLE".into()),
            key_secret: Some("hunter2".into()),
            ..Default::default()
        };
        let line = config.to_string();
        assert!(!line.contains("AKIAEXAMPLE"));
        assert!(!line.contains("hunter2"));
        assert!(line.contains("key_secret=<redacted>"));
        assert!(line.contains("bucket=my-s3-bucket"));
    }

    #[test]
    fn test_pipeline_options() {
        let config = Config {
            workers: 3,
            subfolder: "stable".into(),
            acl: Acl::Public,
            ..Default::default()
        };
        let options = config.pipeline_options();
        assert_eq!(options.workers, 3);
        assert_eq!(options.prefix, "stable");
        assert_eq!(options.acl, Acl::Public);
        assert_eq!(options.source_root, PathBuf::from("files/"));
        assert_eq!(options.dest_root, PathBuf::from("files-uploaded/"));
    }
}
