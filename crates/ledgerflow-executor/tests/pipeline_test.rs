mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ledgerflow_providers::fake::{
    FakeBlobStore, FakeChatProvider, FakeExtractionProvider, FakePdfExtractor, FakeScraper,
};
use ledgerflow_providers::{DiscoveredPdf, PdfDownloader, Providers, ScrapeResult, Scraper};
use ledgerflow_store::{CreateProjectOutcome, JobStatus};

use ledgerflow_executor::StepExecutor;

async fn seeded_project(store: &ledgerflow_store::Store, url: &str) -> ledgerflow_core::Id {
    let CreateProjectOutcome::Created(project) = store
        .create_project_if_absent(url, "Acme Corp")
        .await
        .unwrap()
    else {
        panic!("expected creation");
    };
    project.id
}

fn one_pdf_scrape() -> ScrapeResult {
    ScrapeResult {
        pdfs: vec![DiscoveredPdf {
            source_url: "https://filings.example.com/acme/10k-2025.pdf".to_string(),
            doc_type: "10-K".to_string(),
            period: "2025".to_string(),
        }],
        pdf_info: serde_json::json!({}),
    }
}

fn fake_pdf_downloader(pdfs: &ScrapeResult) -> Arc<dyn PdfDownloader> {
    let mut bodies = HashMap::new();
    for pdf in &pdfs.pdfs {
        bodies.insert(pdf.source_url.clone(), b"Revenue grew 12%.".to_vec());
    }
    Arc::new(ledgerflow_providers::fake::FakePdfDownloader::new(bodies))
}

fn providers_for(scrape: ScrapeResult) -> Arc<Providers> {
    let downloader = fake_pdf_downloader(&scrape);
    Arc::new(Providers {
        scraper: Arc::new(FakeScraper::new(scrape)),
        downloader,
        blob_store: Arc::new(FakeBlobStore::new()),
        pdf_extractor: Arc::new(FakePdfExtractor),
        embedding: Arc::new(ledgerflow_providers::fake::FakeEmbeddingProvider),
        extraction: Arc::new(FakeExtractionProvider),
        chat: Arc::new(FakeChatProvider::new(vec![])),
    })
}

async fn wait_for_terminal(store: &ledgerflow_store::Store, job_id: ledgerflow_core::Id) -> ledgerflow_store::JobRow {
    for _ in 0..200 {
        let job = store.get_job(job_id).await.unwrap();
        if JobStatus::parse(&job.status).is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {job_id} never reached a terminal state");
}

#[tokio::test]
async fn happy_path_runs_every_step_and_produces_a_snapshot() {
    let (_container, store) = common::store().await;
    let project_id = seeded_project(&store, "https://filings.example.com/acme").await;

    let bus = Arc::new(ledgerflow_events::ProgressBus::new());
    let config = Arc::new(common::test_config());
    let providers = providers_for(one_pdf_scrape());
    let executor = StepExecutor::new(store.clone(), bus, providers, config);

    let job_id = executor.start(project_id).await.unwrap();
    let job = wait_for_terminal(&store, job_id).await;

    assert_eq!(JobStatus::parse(&job.status), JobStatus::Completed);
    assert_eq!(job.documents_processed, 1);
    assert_eq!(job.embeddings_created, 1);

    let documents = store.list_documents_for_project(project_id).await.unwrap();
    assert_eq!(documents.len(), 1);

    let snapshot = store.get_latest_snapshot(project_id).await.unwrap();
    assert!(snapshot.is_some());
}

#[tokio::test]
async fn starting_twice_while_active_is_a_conflict() {
    let (_container, store) = common::store().await;
    let project_id = seeded_project(&store, "https://filings.example.com/acme-conflict").await;

    let bus = Arc::new(ledgerflow_events::ProgressBus::new());
    let config = Arc::new(common::test_config());
    let providers = providers_for(one_pdf_scrape());
    let executor = StepExecutor::new(store.clone(), bus, providers, config);

    executor.start(project_id).await.unwrap();
    let second = executor.start(project_id).await;
    assert!(matches!(second, Err(ledgerflow_core::IngestError::Conflict(_))));
}

/// Simulates a crash partway through the pipeline by constructing the Store
/// state a real crash after `upload_to_cloud` would have left behind, then
/// resuming — the already-created document must not be duplicated.
#[tokio::test]
async fn resume_after_a_crash_does_not_duplicate_documents() {
    let (_container, store) = common::store().await;
    let project_id = seeded_project(&store, "https://filings.example.com/acme-resume").await;
    let scrape = one_pdf_scrape();

    let job = match store.acquire_job_slot(project_id).await.unwrap() {
        ledgerflow_store::AcquireJobOutcome::Acquired(job) => job,
        ledgerflow_store::AcquireJobOutcome::Conflict => panic!("expected acquisition"),
    };
    store.start_job(job.id).await.unwrap();

    let pdf = &scrape.pdfs[0];
    let document = store
        .create_document(ledgerflow_store::NewDocument {
            project_id,
            blob_url: "fake://blobs/already-uploaded.pdf",
            source_url: &pdf.source_url,
            doc_type: &pdf.doc_type,
            period: &pdf.period,
        })
        .await
        .unwrap();

    let mut payload = ledgerflow_executor::ResumePayload::default();
    payload.scrape = Some(scrape.clone());
    payload.documents.insert(
        pdf.source_url.clone(),
        ledgerflow_executor::DocumentRef {
            id: document.id.to_string(),
            doc_type: document.doc_type.clone(),
            period: document.period.clone(),
        },
    );
    let payload_json = serde_json::to_value(&payload).unwrap();

    store
        .complete_step(job.id, "upload_to_cloud", 4, payload_json, 1, 0)
        .await
        .unwrap();
    store
        .fail_job(job.id, "simulated crash", "extract_text", true)
        .await
        .unwrap();

    let bus = Arc::new(ledgerflow_events::ProgressBus::new());
    let config = Arc::new(common::test_config());
    let providers = providers_for(scrape);
    let executor = StepExecutor::new(store.clone(), bus, providers, config);

    let resumed_job_id = executor.resume(project_id).await.unwrap();
    assert_eq!(resumed_job_id, job.id);

    let finished = wait_for_terminal(&store, job.id).await;
    assert_eq!(JobStatus::parse(&finished.status), JobStatus::Completed);

    let documents = store.list_documents_for_project(project_id).await.unwrap();
    assert_eq!(documents.len(), 1, "upload_to_cloud must not re-create the already-uploaded document");
}

/// A scraper that blocks until a test-controlled gate opens, giving the
/// test a reliable window to request cancellation before the step returns.
struct GatedScraper {
    result: ScrapeResult,
    gate: tokio::sync::Notify,
}

#[async_trait]
impl Scraper for GatedScraper {
    async fn scrape(&self, _url: &str) -> anyhow::Result<ScrapeResult> {
        self.gate.notified().await;
        Ok(self.result.clone())
    }
}

#[tokio::test]
async fn cancelling_mid_run_transitions_the_job_to_cancelled() {
    let (_container, store) = common::store().await;
    let project_id = seeded_project(&store, "https://filings.example.com/acme-cancel").await;
    let scrape = one_pdf_scrape();

    let gated = Arc::new(GatedScraper {
        result: scrape.clone(),
        gate: tokio::sync::Notify::new(),
    });

    let providers = Arc::new(Providers {
        scraper: gated.clone(),
        downloader: fake_pdf_downloader(&scrape),
        blob_store: Arc::new(FakeBlobStore::new()),
        pdf_extractor: Arc::new(FakePdfExtractor),
        embedding: Arc::new(ledgerflow_providers::fake::FakeEmbeddingProvider),
        extraction: Arc::new(FakeExtractionProvider),
        chat: Arc::new(FakeChatProvider::new(vec![])),
    });

    let bus = Arc::new(ledgerflow_events::ProgressBus::new());
    let config = Arc::new(common::test_config());
    let executor = StepExecutor::new(store.clone(), bus, providers, config);

    let job_id = executor.start(project_id).await.unwrap();

    // Let the run enter `scrape_page` (blocked on the gate), then cancel.
    tokio::time::sleep(Duration::from_millis(50)).await;
    executor.cancel(job_id);
    gated.gate.notify_one();

    let job = wait_for_terminal(&store, job_id).await;
    assert_eq!(JobStatus::parse(&job.status), JobStatus::Cancelled);
    assert!(job.can_resume);
}

#[tokio::test]
async fn a_stale_running_job_is_recovered_and_resumed() {
    let (_container, store) = common::store().await;
    let project_id = seeded_project(&store, "https://filings.example.com/acme-stale").await;

    let job = match store.acquire_job_slot(project_id).await.unwrap() {
        ledgerflow_store::AcquireJobOutcome::Acquired(job) => job,
        ledgerflow_store::AcquireJobOutcome::Conflict => panic!("expected acquisition"),
    };
    store.start_job(job.id).await.unwrap();

    let bus = Arc::new(ledgerflow_events::ProgressBus::new());
    let mut config = common::test_config();
    config.stale_job_threshold_secs = 0; // any elapsed time counts as stale
    let providers = providers_for(one_pdf_scrape());
    let executor = StepExecutor::new(store.clone(), bus, providers, Arc::new(config));

    tokio::time::sleep(Duration::from_millis(20)).await;

    let resumed_job_id = executor.resume(project_id).await.unwrap();
    assert_eq!(resumed_job_id, job.id);

    let finished = wait_for_terminal(&store, job.id).await;
    assert_eq!(JobStatus::parse(&finished.status), JobStatus::Completed);
}
