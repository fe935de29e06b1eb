use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{debug, error};

use crate::error::StorageError;
use crate::store::ObjectStore;

/// Configuration for the S3-backed object store.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// AWS region.
    pub region: String,
    /// Bucket holding documents and page images.
    pub bucket: String,
    /// Endpoint URL override (for LocalStack / MinIO).
    pub endpoint_url: Option<String>,
}

/// [`ObjectStore`] backed by an S3 bucket.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build the store by constructing an AWS SDK client from the
    /// environment plus the given configuration.
    pub async fn connect(config: &S3Config) -> Self {
        let mut loader = aws_config::from_env()
            .region(aws_config::Region::new(config.region.clone()));
        if let Some(ref endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let sdk_config = loader.load().await;

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> Result<(), StorageError> {
        debug!(bucket = %self.bucket, key = %key, size = data.len(), "uploading object to S3");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(key = %key, error = %err_str, "S3 put_object failed");
                StorageError::Backend(err_str)
            })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        debug!(bucket = %self.bucket, key = %key, "downloading object from S3");

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(sdk_err) => {
                // A missing key is an expected cache miss, not a failure.
                if sdk_err
                    .as_service_error()
                    .is_some_and(aws_sdk_s3::operation::get_object::GetObjectError::is_no_such_key)
                {
                    return Ok(None);
                }
                let err_str = sdk_err.to_string();
                error!(key = %key, error = %err_str, "S3 get_object failed");
                return Err(StorageError::Backend(err_str));
            }
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(Some(body.into_bytes()))
    }
}
