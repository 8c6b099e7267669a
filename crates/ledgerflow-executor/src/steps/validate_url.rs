use async_trait::async_trait;
use ledgerflow_core::IngestError;

use super::Step;
use crate::context::StepContext;
use crate::payload::ResumePayload;

/// Step 0. Re-validates the project's filings URL against the fixed
/// pattern. A failure here is fatal — `IngestError::ValidationFailed`
/// already reports `is_fatal_for_step() == true`.
pub struct ValidateUrl;

#[async_trait]
impl Step for ValidateUrl {
    fn name(&self) -> &'static str {
        "validate_url"
    }

    async fn run(
        &self,
        ctx: &StepContext,
        step_index: i32,
        _payload: &mut ResumePayload,
    ) -> Result<(), IngestError> {
        ctx.emit_status(step_index, "Validating filings URL");
        ledgerflow_core::url::validate(&ctx.project_url).map_err(IngestError::ValidationFailed)?;
        Ok(())
    }
}
