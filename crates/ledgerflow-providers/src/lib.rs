//! External-service boundaries the StepExecutor and RetrievalPipeline
//! drive through trait objects: scraping, PDF download/extraction, blob
//! storage, embeddings, structured extraction, and streaming chat.
//!
//! Every trait has one HTTP-backed implementation here and one
//! deterministic in-memory fake under [`fake`] — the executor and
//! retrieval tests are built against the fakes, not mocks of `reqwest`.

pub mod blob_store;
pub mod bundle;
pub mod chat;
pub mod downloader;
pub mod embedding;
pub mod extraction;
pub mod fake;
pub mod pdf_extractor;
pub mod scraper;

pub use blob_store::{BlobStore, S3CompatibleBlobStore};
pub use bundle::Providers;
pub use chat::{ChatProvider, ChatTurn, HttpChatProvider, TokenStream};
pub use downloader::{HttpPdfDownloader, PdfDownloader};
pub use embedding::{EmbeddingProvider, HttpEmbeddingProvider};
pub use extraction::{ExtractionProvider, HttpExtractionProvider};
pub use pdf_extractor::{LopdfExtractor, PdfExtractor};
pub use scraper::{DiscoveredPdf, HttpScraper, ScrapeResult, Scraper};
