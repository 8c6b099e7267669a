use async_trait::async_trait;
use ledgerflow_core::IngestError;

use super::Step;
use crate::context::StepContext;
use crate::payload::ResumePayload;

/// Step 7, final. Synthesizes one company snapshot from every document's
/// extraction result and persists it as a new version. Always regenerates
/// since a prior attempt may have run against a
/// smaller document set.
pub struct GenerateSnapshot;

#[async_trait]
impl Step for GenerateSnapshot {
    fn name(&self) -> &'static str {
        "generate_snapshot"
    }

    async fn run(
        &self,
        ctx: &StepContext,
        step_index: i32,
        payload: &mut ResumePayload,
    ) -> Result<(), IngestError> {
        ctx.emit_status(step_index, "Generating company snapshot");

        let results: Vec<serde_json::Value> = payload.extraction_results.values().cloned().collect();
        if results.is_empty() {
            return Err(IngestError::ValidationFailed(
                "no extraction results available to synthesize a snapshot".into(),
            ));
        }

        let data = ctx
            .providers
            .extraction
            .synthesize_snapshot(&results)
            .await
            .map_err(classify_extraction_error)?;

        let snapshot = ctx.store.insert_snapshot(ctx.project_id, data).await?;
        ctx.emit_progress(step_index, format!("generated snapshot version {}", snapshot.version));

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
