use std::sync::Arc;

use crate::blob_store::BlobStore;
use crate::chat::ChatProvider;
use crate::downloader::PdfDownloader;
use crate::embedding::EmbeddingProvider;
use crate::extraction::ExtractionProvider;
use crate::pdf_extractor::PdfExtractor;
use crate::scraper::Scraper;

/// The external collaborators left out of this crate's own scope, bundled the way the
/// teacher's `ServerDeps` bundles its own provider set — one struct the
/// executor and retrieval pipeline each hold a clone of rather than threading
/// six separate trait objects through every call.
#[derive(Clone)]
pub struct Providers {
    pub scraper: Arc<dyn Scraper>,
    pub downloader: Arc<dyn PdfDownloader>,
    pub blob_store: Arc<dyn BlobStore>,
    pub pdf_extractor: Arc<dyn PdfExtractor>,
    pub embedding: Arc<dyn EmbeddingProvider>,
    pub extraction: Arc<dyn ExtractionProvider>,
    pub chat: Arc<dyn ChatProvider>,
}
