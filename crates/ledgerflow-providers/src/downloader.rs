use anyhow::Result;
use async_trait::async_trait;

/// The `download_pdfs` step's external dependency: fetch raw PDF bytes for a
/// set of discovered URLs. Populates `pdf_buffers`, which the
/// executor base64-encodes into the resume payload.
#[async_trait]
pub trait PdfDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpPdfDownloader {
    client: reqwest::Client,
}

impl HttpPdfDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PdfDownloader for HttpPdfDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("download of {url} returned {}", response.status());
        }
        Ok(response.bytes().await?.to_vec())
    }
}
