use async_trait::async_trait;
use aws_sdk_s3::{error::DisplayErrorContext, operation::get_object::GetObjectError, Client};
use tracing::{debug, info, error};
use crate::domain::{error::JobError, ports::FileFetcher};

pub struct S3FileFetcher {
    client: Client,
}

impl S3FileFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FileFetcher for S3FileFetcher {
    async fn fetch_file(&self, bucket: &str, key: &str) -> Result<Vec<u8>, JobError> {
        debug!("Requesting s3://{}/{}", bucket, key);

        let response = self.client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let message = match e.as_service_error() {
                    Some(GetObjectError::NoSuchKey(_)) => format!("object s3://{}/{} not found", bucket, key),
                    _ => format!("s3://{}/{}: {}", bucket, key, DisplayErrorContext(&e)),
                };
                error!("Failed to get object: {}", message);
                JobError::Fetch(message)
            })?;

        let bytes = response.body
            .collect()
            .await
            .map_err(|e| {
                error!("Failed to read body of s3://{}/{}: {}", bucket, key, e);
                JobError::Fetch(format!("reading body of s3://{}/{}: {}", bucket, key, e))
            })?
            .into_bytes()
            .to_vec();

        info!("Downloaded {} bytes from s3://{}/{}", bytes.len(), bucket, key);
        Ok(bytes)
    }
}
