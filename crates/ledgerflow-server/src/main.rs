mod deps;
mod error;
mod handlers;
mod routes;

use std::sync::Arc;

use anyhow::Result;
use ledgerflow_core::AppConfig;
use ledgerflow_events::{CloseReason, ProgressBus};
use ledgerflow_executor::StepExecutor;
use ledgerflow_providers::{
    HttpChatProvider, HttpEmbeddingProvider, HttpExtractionProvider, HttpPdfDownloader, HttpScraper,
    LopdfExtractor, Providers, S3CompatibleBlobStore,
};
use ledgerflow_retrieval::RetrievalPipeline;
use ledgerflow_store::Store;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::deps::AppDeps;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(AppConfig::from_env()?);

    let store = Store::connect(&config.database_url).await?;

    let http_client = reqwest::Client::new();
    let providers = Arc::new(Providers {
        scraper: Arc::new(HttpScraper::new(http_client.clone())),
        downloader: Arc::new(HttpPdfDownloader::new(http_client.clone())),
        blob_store: Arc::new(S3CompatibleBlobStore::new(
            http_client.clone(),
            config.blob_storage_endpoint.clone(),
            config.blob_storage_bucket.clone(),
            config.blob_storage_access_key.clone(),
            config.blob_storage_secret_key.clone(),
        )),
        pdf_extractor: Arc::new(LopdfExtractor),
        embedding: Arc::new(HttpEmbeddingProvider::new(
            http_client.clone(),
            config.embedding_api_base.clone(),
            config.embedding_api_key.clone(),
            config.embedding_model.clone(),
        )),
        extraction: Arc::new(HttpExtractionProvider::new(
            http_client.clone(),
            config.extraction_api_base.clone(),
            config.extraction_api_key.clone(),
            config.extraction_model.clone(),
        )),
        chat: Arc::new(HttpChatProvider::new(
            http_client,
            config.chat_api_base.clone(),
            config.chat_api_key.clone(),
            config.chat_model.clone(),
        )),
    });

    let bus = Arc::new(ProgressBus::new());
    let executor = StepExecutor::new(store.clone(), bus.clone(), providers.clone(), config.clone());
    let retrieval = RetrievalPipeline::new(store.clone(), providers, config.clone());
    let deps = AppDeps::new(store, bus.clone(), executor, retrieval, config.clone());

    let app = routes::build_router(deps);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "ledgerflow-server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(bus))
        .await?;

    Ok(())
}

/// Waits for Ctrl+C, then closes every open ProgressBus topic with
/// `shutdown` before the server actually stops accepting connections.
async fn shutdown_signal(bus: Arc<ProgressBus>) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, closing progress streams");
    bus.close_all(CloseReason::Shutdown);
}
