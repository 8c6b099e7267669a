use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ledgerflow_core::IngestError;
use ledgerflow_store::NewDocument;

use super::Step;
use crate::context::StepContext;
use crate::payload::{DocumentRef, ResumePayload};

/// Step 3. Pushes each downloaded PDF to blob storage and creates its
/// Document row. Documents already created on an earlier attempt are
/// skipped — resuming never produces duplicate child rows.
pub struct UploadToCloud;

#[async_trait]
impl Step for UploadToCloud {
    fn name(&self) -> &'static str {
        "upload_to_cloud"
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
            .ok_or_else(|| IngestError::Internal("upload_to_cloud reached with no scrape result".into()))?
            .clone();

        ctx.emit_status(step_index, "Uploading filings to blob storage");

        for pdf in &scrape.pdfs {
            ctx.check_cancelled()?;
            if payload.documents.contains_key(&pdf.source_url) {
                continue;
            }

            let encoded = payload.pdf_buffers.get(&pdf.source_url).ok_or_else(|| {
                IngestError::Internal(format!("no downloaded bytes for {}", pdf.source_url))
            })?;
            let bytes = BASE64
                .decode(encoded)
                .map_err(|e| IngestError::Internal(format!("corrupt pdf buffer: {e}")))?;

            let key = format!("{}/{}.pdf", ctx.project_id, uuid_from_url(&pdf.source_url));
            let blob_url = ctx
                .providers
                .blob_store
                .put(&key, "application/pdf", bytes)
                .await
                .map_err(|e| IngestError::Unavailable(e.to_string()))?;

            let document = ctx
                .store
                .create_document(NewDocument {
                    project_id: ctx.project_id,
                    blob_url: &blob_url,
                    source_url: &pdf.source_url,
                    doc_type: &pdf.doc_type,
                    period: &pdf.period,
                })
                .await?;

            ctx.add_documents_processed(1);
            ctx.emit_progress(step_index, format!("uploaded {}", pdf.source_url));

            payload.documents.insert(
                pdf.source_url.clone(),
                DocumentRef {
                    id: document.id.to_string(),
                    doc_type: document.doc_type,
                    period: document.period,
                },
            );
        }

        Ok(())
    }
}

/// Blob keys need not be globally unique beyond the project namespace; a
/// short stable digest of the source URL keeps re-uploads on resume
/// addressing the same key instead of growing without bound.
fn uuid_from_url(url: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
