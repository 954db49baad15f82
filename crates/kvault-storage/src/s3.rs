//! S3-compatible object-store backend.
//!
//! Built on the AWS SDK so the same client speaks to stock S3, MinIO,
//! SeaweedFS, and friends. Everything resolved from the URI (region,
//! static credentials, custom endpoint, TLS, addressing style) is
//! applied here; anything left unset falls through to the ambient
//! provider chain (environment variables, shared config, and so on).

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use tracing::{debug, info, warn};

use kvault_core::{KvaultError, KvaultResult};

use crate::uri::ObjectTarget;

/// Default endpoint when the URI disables TLS without naming one.
const DEFAULT_ENDPOINT: &str = "s3.amazonaws.com";

/// One bucket's worth of object operations.
pub struct ObjectStore {
    client: Client,
    bucket: String,
    region: Option<String>,
}

impl ObjectStore {
    /// Build a client for the resolved target.
    pub async fn connect(target: &ObjectTarget) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &target.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(creds) = &target.credentials {
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key.clone(),
                creds.secret_key.clone(),
                None,
                None,
                "kvault-uri",
            ));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = endpoint_url(target) {
            debug!(endpoint = %endpoint_url, "using custom S3 endpoint");
            builder = builder.endpoint_url(endpoint_url);
        }
        if target.force_path_style {
            builder = builder.force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: target.bucket.clone(),
            region: target.region.clone(),
        })
    }

    /// Idempotent bucket creation.
    ///
    /// "Already exists", "already owned by caller", and "access denied
    /// on create" are benign: the bucket may legitimately pre-exist
    /// without create permission. Any other failure falls back to a
    /// reachability probe; an unreachable bucket is `CreateUnknown`.
    pub async fn ensure_bucket(&self) -> KvaultResult<()> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if let Some(region) = self.region.as_deref().filter(|r| *r != "us-east-1") {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        let err = match request.send().await {
            Ok(_) => {
                info!(bucket = %self.bucket, "created bucket");
                return Ok(());
            }
            Err(err) => err.into_service_error(),
        };

        if err.is_bucket_already_exists() || err.is_bucket_already_owned_by_you() {
            debug!(bucket = %self.bucket, "bucket already exists");
            return Ok(());
        }
        if err.code() == Some("AccessDenied") {
            warn!(bucket = %self.bucket, "no permission to create bucket, assuming it pre-exists");
            return Ok(());
        }

        // neither success nor a recognized benign failure: the bucket
        // must at least be reachable
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(_) => Err(KvaultError::CreateUnknown(self.bucket.clone())),
        }
    }

    /// Upload one object.
    pub async fn put_object(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let key = object_key(key);
        debug!(bucket = %self.bucket, key, bytes = data.len(), "uploading object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/octet-stream")
            .body(ByteStream::from(data))
            .send()
            .await
            .with_context(|| format!("uploading s3://{}/{key}", self.bucket))?;
        Ok(())
    }

    /// Download one object in full.
    pub async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let key = object_key(key);
        debug!(bucket = %self.bucket, key, "downloading object");
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("fetching s3://{}/{key}", self.bucket))?;
        let body = response
            .body
            .collect()
            .await
            .with_context(|| format!("reading body of s3://{}/{key}", self.bucket))?;
        Ok(body.into_bytes().to_vec())
    }
}

/// Endpoint URL override, if the target needs one. A bare host:port gets
/// a scheme chosen by the TLS flag; with neither a custom endpoint nor
/// `secure=false`, the SDK's own regional resolution applies.
fn endpoint_url(target: &ObjectTarget) -> Option<String> {
    let host = match (&target.endpoint, target.tls_disabled) {
        (Some(endpoint), _) => endpoint.as_str(),
        (None, true) => DEFAULT_ENDPOINT,
        (None, false) => return None,
    };
    if host.contains("://") {
        if target.tls_disabled && host.starts_with("https://") {
            warn!(endpoint = host, "secure=false ignored: endpoint already names https");
        }
        return Some(host.to_string());
    }
    let scheme = if target.tls_disabled {
        warn!(endpoint = host, "TLS disabled: credentials travel in plaintext");
        "http"
    } else {
        "https"
    };
    Some(format!("{scheme}://{host}"))
}

/// S3 object keys have no leading separator; URI paths do.
fn object_key(key: &str) -> &str {
    key.trim_start_matches('/')
}
