use async_trait::async_trait;
use ledgerflow_core::IngestError;

use super::Step;
use crate::context::StepContext;
use crate::payload::ResumePayload;

/// Step 1. Finds the PDFs listed on the project's filings page. Already
/// scraped on an earlier attempt at this run → skip. Zero qualifying
/// documents is fatal.
pub struct ScrapePage;

#[async_trait]
impl Step for ScrapePage {
    fn name(&self) -> &'static str {
        "scrape_page"
    }

    async fn run(
        &self,
        ctx: &StepContext,
        step_index: i32,
        payload: &mut ResumePayload,
    ) -> Result<(), IngestError> {
        if payload.scrape.is_some() {
            ctx.emit_status(step_index, "Filings page already scraped, skipping");
            return Ok(());
        }

        ctx.emit_status(step_index, "Scraping filings page");
        let result = ctx
            .providers
            .scraper
            .scrape(&ctx.project_url)
            .await
            .map_err(|e| IngestError::Unavailable(e.to_string()))?;

        if result.pdfs.is_empty() {
            return Err(IngestError::ValidationFailed(
                "filings page contains no qualifying documents".into(),
            ));
        }

        ctx.emit_progress(step_index, format!("found {} filing documents", result.pdfs.len()));
        payload.scrape = Some(result);
        Ok(())
    }
}
