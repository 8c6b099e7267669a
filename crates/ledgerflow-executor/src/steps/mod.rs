mod create_embeddings;
mod download_pdfs;
mod extract_data;
mod extract_text;
mod generate_snapshot;
mod scrape_page;
mod upload_to_cloud;
mod validate_url;

use async_trait::async_trait;
use ledgerflow_core::IngestError;

use crate::context::StepContext;
use crate::payload::ResumePayload;

/// The eight-step pipeline in fixed order. Index into this array is
/// the job's `current_step_index`.
pub const STEP_NAMES: [&str; 8] = [
    "validate_url",
    "scrape_page",
    "download_pdfs",
    "upload_to_cloud",
    "extract_text",
    "extract_data",
    "create_embeddings",
    "generate_snapshot",
];

pub const TOTAL_STEPS: i32 = STEP_NAMES.len() as i32;

/// One step variant: a fixed, ordered enumeration of step
/// variants, each with a typed (input_slice, output_slice) = run(...)
/// signature. `payload` is both the typed input and the typed output:
/// a step reads the fields it needs off it and writes the fields it
/// produces back before returning `Ok`.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        ctx: &StepContext,
        step_index: i32,
        payload: &mut ResumePayload,
    ) -> Result<(), IngestError>;
}

/// Builds the fixed, ordered step array the executor dispatches against. No
/// inheritance, no dynamic registration — just a `Vec` built once.
pub fn all_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(validate_url::ValidateUrl),
        Box::new(scrape_page::ScrapePage),
        Box::new(download_pdfs::DownloadPdfs),
        Box::new(upload_to_cloud::UploadToCloud),
        Box::new(extract_text::ExtractText),
        Box::new(extract_data::ExtractData),
        Box::new(create_embeddings::CreateEmbeddings),
        Box::new(generate_snapshot::GenerateSnapshot),
    ]
}
