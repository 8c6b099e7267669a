mod common;

use ledgerflow_store::{AcquireJobOutcome, CreateProjectOutcome, JobStatus};

async fn seeded_project(store: &ledgerflow_store::Store, url: &str) -> ledgerflow_core::Id {
    let CreateProjectOutcome::Created(project) =
        store.create_project_if_absent(url, "Acme Corp").await.unwrap()
    else {
        panic!("expected creation");
    };
    project.id
}

#[tokio::test]
async fn only_one_active_job_per_project() {
    let (_container, store) = common::store().await;
    let project_id = seeded_project(&store, "https://example.com/jobs-1").await;

    let first = store.acquire_job_slot(project_id).await.unwrap();
    assert!(matches!(first, AcquireJobOutcome::Acquired(_)));

    let second = store.acquire_job_slot(project_id).await.unwrap();
    assert!(matches!(second, AcquireJobOutcome::Conflict));
}

#[tokio::test]
async fn a_completed_job_frees_the_slot_for_a_new_one() {
    let (_container, store) = common::store().await;
    let project_id = seeded_project(&store, "https://example.com/jobs-2").await;

    let AcquireJobOutcome::Acquired(job) = store.acquire_job_slot(project_id).await.unwrap()
    else {
        panic!("expected acquisition");
    };
    store.complete_job(job.id).await.unwrap();

    let second = store.acquire_job_slot(project_id).await.unwrap();
    assert!(matches!(second, AcquireJobOutcome::Acquired(_)));
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let (_container, store) = common::store().await;
    let project_id = seeded_project(&store, "https://example.com/jobs-3").await;

    let AcquireJobOutcome::Acquired(job) = store.acquire_job_slot(project_id).await.unwrap()
    else {
        panic!("expected acquisition");
    };

    assert!(store.cancel_job(job.id).await.unwrap());
    assert!(!store.cancel_job(job.id).await.unwrap());

    let reloaded = store.get_job(job.id).await.unwrap();
    assert_eq!(JobStatus::parse(&reloaded.status), JobStatus::Cancelled);
}

#[tokio::test]
async fn complete_step_persists_resume_payload_and_counters() {
    let (_container, store) = common::store().await;
    let project_id = seeded_project(&store, "https://example.com/jobs-4").await;

    let AcquireJobOutcome::Acquired(job) = store.acquire_job_slot(project_id).await.unwrap()
    else {
        panic!("expected acquisition");
    };
    store.start_job(job.id).await.unwrap();
    store.set_current_step(job.id, "scrape_page", 1).await.unwrap();

    let payload = serde_json::json!({"scraped_urls": ["https://example.com/a.pdf"]});
    store
        .complete_step(job.id, "scrape_page", 2, payload.clone(), 0, 0)
        .await
        .unwrap();

    let reloaded = store.get_job(job.id).await.unwrap();
    assert_eq!(reloaded.last_successful_step.as_deref(), Some("scrape_page"));
    assert_eq!(reloaded.current_step_index, 2);
    assert_eq!(reloaded.resume_payload, payload);
}

#[tokio::test]
async fn stale_running_job_is_coerced_to_failed() {
    let (_container, store) = common::store().await;
    let project_id = seeded_project(&store, "https://example.com/jobs-5").await;

    let AcquireJobOutcome::Acquired(job) = store.acquire_job_slot(project_id).await.unwrap()
    else {
        panic!("expected acquisition");
    };
    store.start_job(job.id).await.unwrap();

    // A job that just started is well within any sane threshold.
    let coerced = store.coerce_if_stale(job.id, 3600).await.unwrap();
    assert!(!coerced);

    // A threshold of zero seconds always counts as stale.
    let coerced = store.coerce_if_stale(job.id, 0).await.unwrap();
    assert!(coerced);

    let reloaded = store.get_job(job.id).await.unwrap();
    assert_eq!(JobStatus::parse(&reloaded.status), JobStatus::Failed);
    assert!(reloaded.can_resume);
}
