//! S3-compatible image store.
//!
//! Talks to any S3-compatible endpoint (MinIO locally, AWS in production)
//! with path-style addressing, so uploaded blobs resolve at
//! `{public_base_url}/{bucket}/{key}`.

use crate::config::BlobConfig;
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use detective_core::{ImageStore, StorageError};

/// Image store backed by an S3-compatible object store.
#[derive(Clone)]
pub struct S3ImageStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ImageStore {
    /// Build a client for the configured endpoint with static credentials
    /// and path-style addressing.
    #[must_use]
    pub fn new(config: &BlobConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "static",
        );
        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create the bucket if it does not exist yet. MinIO starts empty, so
    /// the server calls this once on startup.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the bucket can neither be found nor
    /// created.
    pub async fn ensure_bucket(&self) -> Result<(), StorageError> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }

        match self.client.create_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                tracing::info!(bucket = %self.bucket, "Created image bucket");
                Ok(())
            }
            // A concurrent starter may have won the race.
            Err(e) if is_already_owned(&e) => Ok(()),
            Err(e) => Err(StorageError::new(e)),
        }
    }

    /// The public URL a stored key resolves to (path-style).
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }
}

fn is_already_owned(
    error: &aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::create_bucket::CreateBucketError>,
) -> bool {
    matches!(
        error.as_service_error(),
        Some(service_error)
            if service_error.is_bucket_already_owned_by_you()
                || service_error.is_bucket_already_exists()
    )
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put(
        &self,
        key: &str,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<String, StorageError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        request.send().await.map_err(StorageError::new)?;

        tracing::debug!(bucket = %self.bucket, key = %key, "Stored ticket image");
        Ok(self.public_url(key))
    }
}
