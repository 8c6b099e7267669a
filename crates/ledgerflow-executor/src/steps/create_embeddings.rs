use async_trait::async_trait;
use ledgerflow_core::{Id, IngestError, EMBEDDING_DIM};
use ledgerflow_store::NewChunk;
use std::str::FromStr;

use super::Step;
use crate::chunking::chunk_page_text;
use crate::context::StepContext;
use crate::payload::ResumePayload;

/// Step 6. Chunks each document's page text and embeds every chunk. A page
/// that already has chunks from an earlier attempt is skipped. Per-document
/// and per-batch cancellation checkpoints.
pub struct CreateEmbeddings;

#[async_trait]
impl Step for CreateEmbeddings {
    fn name(&self) -> &'static str {
        "create_embeddings"
    }

    async fn run(
        &self,
        ctx: &StepContext,
        step_index: i32,
        payload: &mut ResumePayload,
    ) -> Result<(), IngestError> {
        ctx.emit_status(step_index, "Creating embeddings");

        let total_documents = payload.documents.len();
        let mut documents_done = 0;

        for doc_ref in payload.documents.clone().into_values() {
            ctx.check_cancelled()?;

            let document_id = Id::from_str(&doc_ref.id)
                .map_err(|e| IngestError::Internal(format!("invalid document id: {e}")))?;

            let pages = ctx.store.list_pages_for_document(document_id).await?;

            for page in pages {
                ctx.check_cancelled()?;

                let already_embedded = ctx.store.count_chunks_for_page(page.id).await?;
                if already_embedded > 0 {
                    continue;
                }

                let texts = chunk_page_text(
                    &page.text,
                    ctx.config.chunk_size,
                    ctx.config.chunk_overlap,
                    ctx.config.max_chunks_per_page,
                );
                if texts.is_empty() {
                    continue;
                }

                let vectors = ctx
                    .providers
                    .embedding
                    .embed_batch(&texts)
                    .await
                    .map_err(classify_embedding_error)?;

                if vectors.len() != texts.len() {
                    return Err(IngestError::Internal(format!(
                        "embedding provider returned {} vectors for {} chunks",
                        vectors.len(),
                        texts.len()
                    )));
                }
                for v in &vectors {
                    if v.len() != EMBEDDING_DIM {
                        return Err(IngestError::ValidationFailed(format!(
                            "embedding dimension {} does not match expected {EMBEDDING_DIM}",
                            v.len()
                        )));
                    }
                }

                let new_chunks: Vec<NewChunk> = texts
                    .into_iter()
                    .zip(vectors)
                    .enumerate()
                    .map(|(i, (content, vector))| NewChunk {
                        page_id: page.id,
                        chunk_index: i as i32,
                        content,
                        field_tag: None,
                        vector,
                    })
                    .collect();

                let created = new_chunks.len() as i32;
                ctx.store.insert_chunks_with_embeddings(new_chunks).await?;
                ctx.add_embeddings_created(created);
                ctx.emit_progress(
                    step_index,
                    format!("embedded {created} chunks for page {}", page.page_no),
                );
            }

            documents_done += 1;
            ctx.emit_progress(
                step_index,
                format!("embedded {documents_done}/{total_documents} documents"),
            );
        }

        Ok(())
    }
}

/// 4xx-shaped provider rejections are fatal, anything
/// else (5xx, timeout, connection failure) is resumable.
fn classify_embedding_error(err: anyhow::Error) -> IngestError {
    let message = err.to_string();
    if message.contains("returned 4") {
        IngestError::ValidationFailed(message)
    } else {
        IngestError::Unavailable(message)
    }
}
