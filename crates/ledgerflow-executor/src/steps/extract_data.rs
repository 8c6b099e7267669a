use async_trait::async_trait;
use ledgerflow_core::{Id, IngestError};
use std::str::FromStr;

use super::Step;
use crate::context::StepContext;
use crate::payload::ResumePayload;

/// Step 5. Turns each document's page text into a structured
/// ExtractionResult. A document already holding an entry in
/// `extraction_results` from an earlier attempt is skipped.
pub struct ExtractData;

#[async_trait]
impl Step for ExtractData {
    fn name(&self) -> &'static str {
        "extract_data"
    }

    async fn run(
        &self,
        ctx: &StepContext,
        step_index: i32,
        payload: &mut ResumePayload,
    ) -> Result<(), IngestError> {
        ctx.emit_status(step_index, "Extracting structured data from documents");

        let total = payload.documents.len();
        let mut done = 0;

        for doc_ref in payload.documents.clone().into_values() {
            ctx.check_cancelled()?;

            if payload.extraction_results.contains_key(&doc_ref.id) {
                done += 1;
                continue;
            }

            let document_id = Id::from_str(&doc_ref.id)
                .map_err(|e| IngestError::Internal(format!("invalid document id: {e}")))?;

            let pages = ctx.store.list_pages_for_document(document_id).await?;
            let page_text = pages
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");

            let data = ctx
                .providers
                .extraction
                .extract(&doc_ref.doc_type, &doc_ref.period, &page_text)
                .await
                .map_err(classify_extraction_error)?;

            let citations = data.get("citations").cloned();
            let reasoning = data.get("reasoning").and_then(|v| v.as_str()).map(str::to_string);

            ctx.store
                .insert_extraction_result(document_id, data.clone(), citations, reasoning.as_deref())
                .await?;

            payload.extraction_results.insert(doc_ref.id.clone(), data);
            done += 1;
            ctx.emit_progress(step_index, format!("extracted data for {done}/{total} documents"));
        }

        Ok(())
    }
}

/// 4xx-shaped provider rejections are fatal, anything
/// else (5xx, timeout, connection failure) is resumable.
fn classify_extraction_error(err: anyhow::Error) -> IngestError {
    let message = err.to_string();
    if message.contains("returned 4") {
        IngestError::ValidationFailed(message)
    } else {
        IngestError::Unavailable(message)
    }
}
