//! Requires Docker. Set `TESTCONTAINERS_SKIP=1` in CI environments without it
//! and these tests panic loudly rather than silently passing.

mod common;

use ledgerflow_store::{CreateProjectOutcome, NewDocument};

#[tokio::test]
async fn create_project_if_absent_is_idempotent_on_url() {
    let (_container, store) = common::store().await;

    let first = store
        .create_project_if_absent("https://example.com/a", "Acme Corp")
        .await
        .unwrap();
    let CreateProjectOutcome::Created(project) = first else {
        panic!("expected first insert to create");
    };

    let second = store
        .create_project_if_absent("https://example.com/a", "Acme Corp (retry)")
        .await
        .unwrap();
    assert!(matches!(second, CreateProjectOutcome::AlreadyExists));

    let fetched = store.get_project(project.id).await.unwrap();
    assert_eq!(fetched.display_name, "Acme Corp");
}

#[tokio::test]
async fn delete_project_cascades_to_documents() {
    let (_container, store) = common::store().await;

    let CreateProjectOutcome::Created(project) = store
        .create_project_if_absent("https://example.com/b", "Beta Inc")
        .await
        .unwrap()
    else {
        panic!("expected creation");
    };

    let doc = store
        .create_document(NewDocument {
            project_id: project.id,
            blob_url: "https://blob.example.com/a.pdf",
            source_url: "https://example.com/b/a.pdf",
            doc_type: "annual-report",
            period: "2023",
        })
        .await
        .unwrap();

    store.delete_project(project.id).await.unwrap();

    let docs = store.list_documents_for_project(project.id).await.unwrap();
    assert!(docs.is_empty());
    assert!(store.get_project(project.id).await.is_err());
    let _ = doc;
}

#[tokio::test]
async fn list_projects_orders_most_recent_first() {
    let (_container, store) = common::store().await;

    store
        .create_project_if_absent("https://example.com/c1", "C1")
        .await
        .unwrap();
    store
        .create_project_if_absent("https://example.com/c2", "C2")
        .await
        .unwrap();

    let page = store.list_projects(0, 10).await.unwrap();
    assert!(page.len() >= 2);
    assert_eq!(page[0].display_name, "C2");
}
