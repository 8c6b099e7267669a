mod common;

use std::sync::Arc;

use futures::StreamExt;
use ledgerflow_core::Id;
use ledgerflow_events::Event;
use ledgerflow_providers::fake::{
    FakeBlobStore, FakeChatProvider, FakeEmbeddingProvider, FakeExtractionProvider, FakePdfExtractor,
    FakeScraper,
};
use ledgerflow_providers::Providers;
use ledgerflow_store::{CreateProjectOutcome, NewChunk, NewDocument};
use ledgerflow_retrieval::RetrievalPipeline;
use tokio_util::sync::CancellationToken;

use ledgerflow_providers::EmbeddingProvider;

async fn seed_project_with_chunk(store: &ledgerflow_store::Store, url: &str, content: &str) -> Id {
    let CreateProjectOutcome::Created(project) =
        store.create_project_if_absent(url, "Acme Corp").await.unwrap()
    else {
        panic!("expected creation");
    };

    let doc = store
        .create_document(NewDocument {
            project_id: project.id,
            blob_url: "https://blob.example.com/a.pdf",
            source_url: url,
            doc_type: "10-K",
            period: "FY2025",
        })
        .await
        .unwrap();
    let page = store.upsert_page(doc.id, 1, content).await.unwrap();

    let vector = FakeEmbeddingProvider.embed(content).await.unwrap();
    store
        .insert_chunks_with_embeddings(vec![NewChunk {
            page_id: page.id,
            chunk_index: 0,
            content: content.to_string(),
            field_tag: Some("revenue".to_string()),
            vector,
        }])
        .await
        .unwrap();

    project.id
}

fn providers(tokens: Vec<String>) -> Arc<Providers> {
    Arc::new(Providers {
        scraper: Arc::new(FakeScraper::new(ledgerflow_providers::ScrapeResult {
            pdfs: vec![],
            pdf_info: serde_json::json!({}),
        })),
        downloader: Arc::new(ledgerflow_providers::fake::FakePdfDownloader::new(Default::default())),
        blob_store: Arc::new(FakeBlobStore::new()),
        pdf_extractor: Arc::new(FakePdfExtractor),
        embedding: Arc::new(FakeEmbeddingProvider),
        extraction: Arc::new(FakeExtractionProvider),
        chat: Arc::new(FakeChatProvider::new(tokens)),
    })
}

#[tokio::test]
async fn answer_streams_status_context_start_chunks_then_done() {
    let (_container, store) = common::store().await;
    let project_id = seed_project_with_chunk(&store, "https://filings.example.com/retrieval-a", "Revenue grew 12%").await;

    let chat = store.create_chat(None).await.unwrap();
    let config = Arc::new(common::test_config());
    let pipeline = RetrievalPipeline::new(store.clone(), providers(vec!["hel".into(), "lo".into()]), config);

    let events: Vec<Event> = pipeline
        .answer(chat.id, "How much did revenue grow?".to_string(), vec![project_id], CancellationToken::new())
        .collect()
        .await;

    assert!(matches!(events[0], Event::Status { .. }));
    assert!(matches!(events[1], Event::Status { .. }));
    assert!(matches!(events[2], Event::Context { chunks_found: 1 }));
    assert!(matches!(events[3], Event::Start {}));

    let chunk_content: String = events
        .iter()
        .filter_map(|e| match e {
            Event::Chunk { content } => Some(content.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(chunk_content, "hello");

    match events.last().unwrap() {
        Event::Done { message_id } => {
            let messages = store.list_messages_for_chat(chat.id).await.unwrap();
            let assistant = messages.iter().find(|m| m.id.to_string() == *message_id).unwrap();
            assert_eq!(assistant.content, "hello");
        }
        other => panic!("expected done event, got {other:?}"),
    }

    let messages = store.list_messages_for_chat(chat.id).await.unwrap();
    assert_eq!(messages.len(), 2, "expects one persisted user turn and one assistant turn");
}

#[tokio::test]
async fn empty_project_ids_emits_error_without_starting_generation() {
    let (_container, store) = common::store().await;
    let chat = store.create_chat(None).await.unwrap();
    let config = Arc::new(common::test_config());
    let pipeline = RetrievalPipeline::new(store.clone(), providers(vec!["never".into()]), config);

    let events: Vec<Event> = pipeline
        .answer(chat.id, "anything".to_string(), vec![], CancellationToken::new())
        .collect()
        .await;

    assert!(matches!(events.last(), Some(Event::Error { .. })));
    assert!(!events.iter().any(|e| matches!(e, Event::Start {} | Event::Done { .. })));
}

#[tokio::test]
async fn cancelling_before_the_stream_completes_discards_the_assistant_message() {
    let (_container, store) = common::store().await;
    let project_id = seed_project_with_chunk(&store, "https://filings.example.com/retrieval-cancel", "Net income fell").await;
    let chat = store.create_chat(None).await.unwrap();
    let config = Arc::new(common::test_config());
    let pipeline = RetrievalPipeline::new(store.clone(), providers(vec!["a".into(), "b".into(), "c".into()]), config);

    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let events: Vec<Event> = pipeline
        .answer(chat.id, "How did income change?".to_string(), vec![project_id], cancellation)
        .collect()
        .await;

    assert!(!events.iter().any(|e| matches!(e, Event::Done { .. })));

    let messages = store.list_messages_for_chat(chat.id).await.unwrap();
    assert_eq!(messages.len(), 1, "only the user turn should be persisted when cancelled");
}
