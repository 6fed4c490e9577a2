//! S3-compatible object store.
//!
//! This module provides a [`Store`] implementation for S3-compatible
//! services: AWS S3 itself, and MinIO (or any other clone) reached through a
//! custom endpoint.
//!
//! # Credentials
//!
//! Credentials are provided explicitly. The binary reads them from its
//! configuration, which in turn picks up the standard `AWS_ACCESS_KEY_ID` and
//! `AWS_SECRET_ACCESS_KEY` environment variables.

use crate::{
    Store,
    error::{ErrorKind, Result},
    models::{Acl, PutAck},
    validate_key,
};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::ObjectCannedAcl,
};

/// Error codes that S3 (and clones) use for authorization failures.
const PERMISSION_CODES: [&str; 4] =
    ["AccessDenied", "InvalidAccessKeyId", "SignatureDoesNotMatch", "AllAccessDisabled"];

/// S3-compatible object store.
///
/// The underlying [`Client`] is cheap to clone and safe for concurrent use,
/// so a single instance is shared by every upload worker.
///
/// # Examples
///
/// ```no_run
/// use s3bulk_storage::backend::S3Store;
///
/// let store = S3Store::new(
///     "minio",
///     "my-s3-bucket",
///     "eu-west-1",
///     Some("http://localhost:9000"),
///     "access_key_id",
///     "secret_access_key",
/// );
/// ```
#[derive(Debug, Clone)]
pub struct S3Store {
    name: String,
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Create a new S3 store.
    ///
    /// # Arguments
    /// * `name` - A name for this store (used in logging)
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region, or whatever region string the clone expects
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - Access key ID
    /// * `key_secret` - Secret access key
    pub fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        let credentials = Credentials::new(key_id, key_secret, None, None, "s3bulk-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            // The SDK's own retries cover transient transport failures only;
            // a rejected put is left for the next run of the tool.
            .retry_config(RetryConfig::standard().with_max_attempts(3))
            // Path-style addressing for compatibility with MinIO and friends.
            .force_path_style(true);
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Self::from_client(name, bucket, Client::from_conf(config_builder.build()))
    }

    /// Wrap an already-configured [`Client`].
    pub fn from_client(name: impl Into<String>, bucket: impl Into<String>, client: Client) -> Self {
        Self {
            name: name.into(),
            client,
            bucket: bucket.into(),
        }
    }

    fn canned_acl(acl: Acl) -> ObjectCannedAcl {
        match acl {
            Acl::Private => ObjectCannedAcl::Private,
            Acl::Public => ObjectCannedAcl::PublicRead,
        }
    }

    /// Sort an SDK failure into one of our actionable categories.
    fn classify<E, R>(err: &SdkError<E, R>, key: &str) -> ErrorKind
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        match err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
                ErrorKind::Network(DisplayErrorContext(err).to_string())
            },
            SdkError::ServiceError(service) if service.err().code().is_some_and(|c| PERMISSION_CODES.contains(&c)) => {
                ErrorKind::PermissionDenied(key.to_string())
            },
            _ => ErrorKind::BackendError(DisplayErrorContext(err).to_string()),
        }
    }
}

#[async_trait]
impl Store for S3Store {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, key: &str, body: Vec<u8>, acl: Acl) -> Result<PutAck> {
        let key = validate_key(key)?;
        // Object names are stored without the leading separator.
        let object_key = key.trim_start_matches('/');
        let size = body.len();
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key)
            .acl(Self::canned_acl(acl))
            .body(ByteStream::from(body));
        match request.send().await {
            Ok(output) => {
                tracing::debug!(store = %self.name, bucket = %self.bucket, key, bytes = size, "Object stored");
                Ok(PutAck::new(output.e_tag()))
            },
            Err(err) => {
                let kind = Self::classify(&err, key);
                Err(exn::Exn::from(err).raise(kind))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::put_object::{PutObjectError, PutObjectOutput};
    use aws_smithy_mocks::{mock, mock_client};

    const KEY: &str = "/core/pkg/1.2.0/20230101000000/x86_64/linux/pkg-1.2.0.tar";
    const OBJECT_KEY: &str = "core/pkg/1.2.0/20230101000000/x86_64/linux/pkg-1.2.0.tar";

    #[tokio::test]
    async fn test_put_sends_bucket_key_and_acl() {
        let rule = mock!(Client::put_object)
            .match_requests(|req| {
                req.bucket() == Some("packages")
                    && req.key() == Some(OBJECT_KEY)
                    && req.acl() == Some(&ObjectCannedAcl::PublicRead)
            })
            .then_output(|| PutObjectOutput::builder().e_tag("\"d41d8cd9\"").build());
        let client = mock_client!(aws_sdk_s3, [&rule]);
        let store = S3Store::from_client("test", "packages", client);
        let ack = store.put(KEY, b"archive".to_vec(), Acl::Public).await.unwrap();
        assert_eq!(ack.e_tag.as_deref(), Some("\"d41d8cd9\""));
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_put_stores_object_name_without_leading_slash() {
        let rule = mock!(Client::put_object)
            .match_requests(|req| req.key().is_some_and(|key| !key.starts_with('/')))
            .then_output(|| PutObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, [&rule]);
        let store = S3Store::from_client("test", "my-s3-bucket", client);
        store
            .put("/stable/core/pkg/1.2.0/20230101000000/x86_64/linux/pkg.hart", b"archive".to_vec(), Acl::Private)
            .await
            .unwrap();
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_invalid_key_without_request() {
        let rule = mock!(Client::put_object).then_output(|| PutObjectOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, [&rule]);
        let store = S3Store::from_client("test", "packages", client);
        let err = store.put("no/leading/slash", Vec::new(), Acl::Private).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(_)));
        assert_eq!(rule.num_calls(), 0);
    }

    #[tokio::test]
    async fn test_put_access_denied() {
        let rule = mock!(Client::put_object).then_error(|| {
            PutObjectError::generic(ErrorMetadata::builder().code("AccessDenied").message("denied").build())
        });
        let client = mock_client!(aws_sdk_s3, [&rule]);
        let store = S3Store::from_client("test", "packages", client);
        let err = store.put(KEY, b"archive".to_vec(), Acl::Private).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::PermissionDenied(k) if k == KEY));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_put_other_service_error() {
        let rule = mock!(Client::put_object).then_error(|| {
            PutObjectError::generic(ErrorMetadata::builder().code("NoSuchBucket").message("gone").build())
        });
        let client = mock_client!(aws_sdk_s3, [&rule]);
        let store = S3Store::from_client("test", "packages", client);
        let err = store.put(KEY, b"archive".to_vec(), Acl::Private).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BackendError(_)));
    }

    #[test]
    fn test_canned_acl_mapping() {
        assert_eq!(S3Store::canned_acl(Acl::Private), ObjectCannedAcl::Private);
        assert_eq!(S3Store::canned_acl(Acl::Public), ObjectCannedAcl::PublicRead);
    }
}
