use anyhow::Result;
use async_trait::async_trait;

/// The `upload_to_cloud` step's external dependency: push a document's
/// bytes to durable blob storage and hand back the URL recorded on the
/// Document row.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;
}

/// Speaks the S3-compatible PUT-object API directly over `reqwest` rather
/// than pulling in a full SDK — every object store this pipeline targets
/// (S3, R2, MinIO) accepts a plain signed-or-public PUT to `{endpoint}/{bucket}/{key}`.
pub struct S3CompatibleBlobStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    access_key: String,
    secret_key: String,
}

impl S3CompatibleBlobStore {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3CompatibleBlobStore {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let url = format!("{}/{}/{}", self.endpoint.trim_end_matches('/'), self.bucket, key);

        let response = self
            .client
            .put(&url)
            .basic_auth(&self.access_key, Some(&self.secret_key))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("blob upload to {url} returned {}", response.status());
        }

        tracing::info!(key, bucket = %self.bucket, "uploaded blob");
        Ok(url)
    }
}
