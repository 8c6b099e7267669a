use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ledgerflow_core::{Id, IngestError};
use std::str::FromStr;

use super::Step;
use crate::context::StepContext;
use crate::payload::ResumePayload;

/// Step 4. Turns each document's PDF bytes into 1-indexed page text.
/// Per-document cancellation checkpoint. A document that already has
/// pages from an earlier attempt is skipped.
pub struct ExtractText;

#[async_trait]
impl Step for ExtractText {
    fn name(&self) -> &'static str {
        "extract_text"
    }

    async fn run(
        &self,
        ctx: &StepContext,
        step_index: i32,
        payload: &mut ResumePayload,
    ) -> Result<(), IngestError> {
        ctx.emit_status(step_index, "Extracting page text from PDFs");

        let total = payload.documents.len();
        let mut done = 0;

        for (source_url, doc_ref) in payload.documents.clone() {
            ctx.check_cancelled()?;

            let document_id = Id::from_str(&doc_ref.id)
                .map_err(|e| IngestError::Internal(format!("invalid document id: {e}")))?;

            let existing_pages = ctx.store.list_pages_for_document(document_id).await?;
            if !existing_pages.is_empty() {
                done += 1;
                continue;
            }

            let encoded = payload.pdf_buffers.get(&source_url).ok_or_else(|| {
                IngestError::Internal(format!("no downloaded bytes for {source_url}"))
            })?;
            let bytes = BASE64
                .decode(encoded)
                .map_err(|e| IngestError::Internal(format!("corrupt pdf buffer: {e}")))?;

            let pages = ctx
                .providers
                .pdf_extractor
                .extract_pages(&bytes)
                .await
                .map_err(|e| IngestError::Unavailable(e.to_string()))?;

            for (zero_based, text) in pages.iter().enumerate() {
                let page_no = (zero_based + 1) as i32;
                ctx.store.upsert_page(document_id, page_no, text).await?;
            }
            ctx.store
                .set_document_page_count(document_id, pages.len() as i32)
                .await?;

            done += 1;
            ctx.emit_progress(step_index, format!("extracted text for {done}/{total} documents"));
        }

        Ok(())
    }
}
