use std::collections::HashMap;

use ledgerflow_providers::ScrapeResult;
use serde::{Deserialize, Serialize};

/// A document created by `upload_to_cloud`, carried forward so later steps
/// don't need to re-query the Store for ids they already produced this run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub doc_type: String,
    pub period: String,
}

/// The opaque resume payload. The Store treats this as
/// schemaless bytes; this is the only place its shape is known. Keyed
/// throughout by a discovered PDF's `source_url`, which is stable across
/// every step from `scrape_page` onward — unlike a Document id, which
/// doesn't exist until `upload_to_cloud` runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumePayload {
    /// Produced by `scrape_page`; consumed by `download_pdfs` and
    /// `upload_to_cloud` (which also reads `pdf_info` off it).
    pub scrape: Option<ScrapeResult>,

    /// `source_url -> base64(bytes)`. Produced by `download_pdfs`;
    /// consumed by `upload_to_cloud` and `extract_text`.
    #[serde(default)]
    pub pdf_buffers: HashMap<String, String>,

    /// `source_url -> DocumentRef`. Produced by `upload_to_cloud`; consumed
    /// by every step downstream of it.
    #[serde(default)]
    pub documents: HashMap<String, DocumentRef>,

    /// `document_id -> extraction JSON`. Produced by `extract_data`;
    /// consumed by `create_embeddings` (field tagging) and
    /// `generate_snapshot`.
    #[serde(default)]
    pub extraction_results: HashMap<String, serde_json::Value>,
}
