//! Deterministic in-memory stand-ins for every provider trait, grounded on
//! the same shape as a mock embedder elsewhere in this codebase: no
//! network, no randomness, predictable output a test can assert on.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::blob_store::BlobStore;
use crate::chat::{ChatProvider, ChatTurn, TokenStream};
use crate::downloader::PdfDownloader;
use crate::embedding::EmbeddingProvider;
use crate::extraction::ExtractionProvider;
use crate::pdf_extractor::PdfExtractor;
use crate::scraper::{ScrapeResult, Scraper};
use ledgerflow_core::EMBEDDING_DIM;

/// Always returns the same `ScrapeResult`, regardless of the URL asked for.
pub struct FakeScraper {
    result: ScrapeResult,
}

impl FakeScraper {
    pub fn new(result: ScrapeResult) -> Self {
        Self { result }
    }
}

#[async_trait]
impl Scraper for FakeScraper {
    async fn scrape(&self, _url: &str) -> Result<ScrapeResult> {
        Ok(self.result.clone())
    }
}

/// Serves bytes out of a fixed url -> bytes map.
pub struct FakePdfDownloader {
    bodies: HashMap<String, Vec<u8>>,
}

impl FakePdfDownloader {
    pub fn new(bodies: HashMap<String, Vec<u8>>) -> Self {
        Self { bodies }
    }
}

#[async_trait]
impl PdfDownloader for FakePdfDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.bodies
            .get(url)
            .cloned()
            .with_context(|| format!("no fake body registered for {url}"))
    }
}

/// Records every `put` call instead of sending it anywhere, and returns a
/// `fake://` URL a test can assert on.
#[derive(Default)]
pub struct FakeBlobStore {
    puts: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl FakeBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn puts(&self) -> Vec<(String, String, Vec<u8>)> {
        self.puts.lock().expect("fake blob store mutex poisoned").clone()
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let url = format!("fake://blobs/{key}");
        self.puts
            .lock()
            .expect("fake blob store mutex poisoned")
            .push((key.to_string(), content_type.to_string(), bytes));
        Ok(url)
    }
}

/// Treats the "PDF bytes" as UTF-8 text with form-feed (`\f`) page breaks —
/// lets tests build fake documents without round-tripping through `lopdf`.
pub struct FakePdfExtractor;

#[async_trait]
impl PdfExtractor for FakePdfExtractor {
    async fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>> {
        let text = String::from_utf8_lossy(pdf_bytes);
        Ok(text.split('\x0c').map(|s| s.to_string()).collect())
    }
}

/// Deterministic, content-derived vectors: the first bytes of the input
/// become the leading components, everything else is zero. Different
/// inputs reliably produce different (and reproducibly ordered) vectors
/// without any model call.
pub struct FakeEmbeddingProvider;

fn fake_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    for (i, b) in text.bytes().take(EMBEDDING_DIM).enumerate() {
        v[i] = b as f32 / 255.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for FakeEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(fake_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| fake_vector(t)).collect())
    }
}

/// Echoes its input back as the "extraction", tagged so a test can confirm
/// which page/document produced which result.
pub struct FakeExtractionProvider;

#[async_trait]
impl ExtractionProvider for FakeExtractionProvider {
    async fn extract(&self, doc_type: &str, period: &str, page_text: &str) -> Result<Value> {
        Ok(json!({
            "doc_type": doc_type,
            "period": period,
            "excerpt": page_text.chars().take(80).collect::<String>(),
            "citations": [],
            "reasoning": "fake extraction",
        }))
    }

    async fn synthesize_snapshot(&self, extraction_results: &[Value]) -> Result<Value> {
        Ok(json!({
            "source_count": extraction_results.len(),
            "extractions": extraction_results,
        }))
    }
}

/// Streams a fixed, pre-scripted sequence of tokens instead of calling a
/// model, ignoring the prompt it was given.
pub struct FakeChatProvider {
    tokens: Vec<String>,
}

impl FakeChatProvider {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl ChatProvider for FakeChatProvider {
    async fn stream_chat(&self, _turns: Vec<ChatTurn>) -> Result<TokenStream> {
        let tokens = self.tokens.clone();
        Ok(Box::pin(futures::stream::iter(tokens.into_iter().map(Ok))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn fake_embedding_is_deterministic_and_content_sensitive() {
        let provider = FakeEmbeddingProvider;
        let a = provider.embed("revenue grew 12%").await.unwrap();
        let b = provider.embed("revenue grew 12%").await.unwrap();
        let c = provider.embed("net loss widened").await.unwrap();

        assert_eq!(a.len(), EMBEDDING_DIM);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn fake_pdf_extractor_splits_on_form_feed() {
        let bytes = "page one\x0cpage two\x0cpage three".as_bytes().to_vec();
        let pages = FakePdfExtractor.extract_pages(&bytes).await.unwrap();
        assert_eq!(pages, vec!["page one", "page two", "page three"]);
    }

    #[tokio::test]
    async fn fake_blob_store_records_puts() {
        let store = FakeBlobStore::new();
        let url = store.put("doc-1.pdf", "application/pdf", vec![1, 2, 3]).await.unwrap();
        assert_eq!(url, "fake://blobs/doc-1.pdf");
        assert_eq!(store.puts().len(), 1);
    }

    #[tokio::test]
    async fn fake_chat_provider_streams_scripted_tokens() {
        let provider = FakeChatProvider::new(vec!["hel".into(), "lo".into()]);
        let mut stream = provider.stream_chat(vec![]).await.unwrap();
        let mut out = String::new();
        while let Some(token) = stream.next().await {
            out.push_str(&token.unwrap());
        }
        assert_eq!(out, "hello");
    }
}
