use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ledgerflow_core::IngestError;

use super::Step;
use crate::context::StepContext;
use crate::payload::ResumePayload;

/// Step 2. Fetches raw bytes for every discovered PDF not already in
/// `pdf_buffers` from an earlier attempt.
pub struct DownloadPdfs;

#[async_trait]
impl Step for DownloadPdfs {
    fn name(&self) -> &'static str {
        "download_pdfs"
    }

    async fn run(
        &self,
        ctx: &StepContext,
        step_index: i32,
        payload: &mut ResumePayload,
    ) -> Result<(), IngestError> {
        let scrape = payload
            .scrape
            .as_ref()
            .ok_or_else(|| IngestError::Internal("download_pdfs reached with no scrape result".into()))?;

        ctx.emit_status(step_index, "Downloading filing PDFs");
        let total = scrape.pdfs.len();
        let mut downloaded = payload
            .pdf_buffers
            .len()
            .min(total);

        for pdf in &scrape.pdfs {
            ctx.check_cancelled()?;
            if payload.pdf_buffers.contains_key(&pdf.source_url) {
                continue;
            }

            let bytes = ctx
                .providers
                .downloader
                .download(&pdf.source_url)
                .await
                .map_err(|e| IngestError::Unavailable(e.to_string()))?;

            payload.pdf_buffers.insert(pdf.source_url.clone(), BASE64.encode(bytes));
            downloaded += 1;
            ctx.emit_progress(step_index, format!("downloaded {downloaded}/{total}"));
        }

        Ok(())
    }
}
