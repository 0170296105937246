use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client as S3Client, primitives::ByteStream};
use futures::future::BoxFuture;

use super::storage::{CheckpointStorage, StorageError, StorageResult};

/// Stores checkpoints in an S3-compatible bucket (AWS S3, MinIO, ...).
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    /// Store objects in `bucket` under `prefix`.
    pub fn new(client: S3Client, bucket: impl Into<String>, prefix: impl AsRef<str>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.as_ref().trim_matches('/').to_string(),
        }
    }

    /// Build a client from the standard AWS environment (`AWS_REGION`, `AWS_ENDPOINT_URL`, ...).
    pub async fn from_env(bucket: impl Into<String>, prefix: impl AsRef<str>) -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();
        Self::new(S3Client::from_conf(s3_config), bucket, prefix)
    }

    fn object_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.prefix, key)
        }
    }
}

impl CheckpointStorage for S3Storage {
    fn save<'a>(&'a self, key: &'a str, data: Vec<u8>) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            let object_key = self.object_key(key);
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&object_key)
                .body(ByteStream::from(data))
                .send()
                .await
                .map_err(|err| {
                    StorageError::unavailable(format!("failed to write s3://{}/{object_key}", self.bucket), err)
                })?;
            Ok(())
        })
    }

    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StorageResult<Option<Vec<u8>>>> {
        Box::pin(async move {
            let object_key = self.object_key(key);
            let response = match self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(&object_key)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err)
                    if err
                        .as_service_error()
                        .is_some_and(|service| service.is_no_such_key()) =>
                {
                    return Ok(None);
                }
                Err(err) => {
                    return Err(StorageError::unavailable(
                        format!("failed to read s3://{}/{object_key}", self.bucket),
                        err,
                    ));
                }
            };

            let data = response.body.collect().await.map_err(|err| {
                StorageError::unavailable(
                    format!("failed to collect s3://{}/{object_key}", self.bucket),
                    err,
                )
            })?;
            Ok(Some(data.into_bytes().to_vec()))
        })
    }
}
