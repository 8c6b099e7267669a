mod common;

use ledgerflow_core::{Id, EMBEDDING_DIM};
use ledgerflow_store::{CreateProjectOutcome, NewChunk, NewDocument};

fn unit_vector(hot_index: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[hot_index] = 1.0;
    v
}

async fn seed_page(store: &ledgerflow_store::Store, project_url: &str) -> Id {
    let CreateProjectOutcome::Created(project) = store
        .create_project_if_absent(project_url, "Acme Corp")
        .await
        .unwrap()
    else {
        panic!("expected creation");
    };

    let doc = store
        .create_document(NewDocument {
            project_id: project.id,
            blob_url: "https://blob.example.com/a.pdf",
            source_url: project_url,
            doc_type: "annual-report",
            period: "2023",
        })
        .await
        .unwrap();

    let page = store.upsert_page(doc.id, 1, "revenue grew 12%").await.unwrap();
    page.id
}

#[tokio::test]
async fn knn_rejects_empty_project_set() {
    let (_container, store) = common::store().await;
    let result = store.knn(&unit_vector(0), &[], 5).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn knn_rejects_wrong_dimension_query() {
    let (_container, store) = common::store().await;
    let _page_id = seed_page(&store, "https://example.com/knn-dim").await;

    let result = store.knn(&[0.0f32; 4], &[Id::new()], 5).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn knn_orders_by_distance_ascending_with_tiebreak() {
    let (_container, store) = common::store().await;

    let CreateProjectOutcome::Created(project) = store
        .create_project_if_absent("https://example.com/knn-order", "Acme Corp")
        .await
        .unwrap()
    else {
        panic!("expected creation");
    };

    let doc = store
        .create_document(NewDocument {
            project_id: project.id,
            blob_url: "https://blob.example.com/a.pdf",
            source_url: "https://example.com/knn-order/a.pdf",
            doc_type: "annual-report",
            period: "2023",
        })
        .await
        .unwrap();
    let page = store.upsert_page(doc.id, 1, "revenue").await.unwrap();

    let chunks = vec![
        NewChunk {
            page_id: page.id,
            chunk_index: 0,
            content: "far".to_string(),
            field_tag: None,
            vector: unit_vector(10),
        },
        NewChunk {
            page_id: page.id,
            chunk_index: 1,
            content: "near".to_string(),
            field_tag: None,
            vector: unit_vector(0),
        },
    ];
    store.insert_chunks_with_embeddings(chunks).await.unwrap();

    let matches = store.knn(&unit_vector(0), &[project.id], 10).await.unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].content, "near");
    assert_eq!(matches[1].content, "far");
    assert!(matches[0].distance <= matches[1].distance);
}

#[tokio::test]
async fn knn_scopes_results_to_requested_projects() {
    let (_container, store) = common::store().await;

    let CreateProjectOutcome::Created(project_a) = store
        .create_project_if_absent("https://example.com/knn-scope-a", "A")
        .await
        .unwrap()
    else {
        panic!("expected creation");
    };
    let CreateProjectOutcome::Created(project_b) = store
        .create_project_if_absent("https://example.com/knn-scope-b", "B")
        .await
        .unwrap()
    else {
        panic!("expected creation");
    };

    for (project, content) in [(project_a.clone(), "a-content"), (project_b.clone(), "b-content")] {
        let doc = store
            .create_document(NewDocument {
                project_id: project.id,
                blob_url: "https://blob.example.com/x.pdf",
                source_url: "https://example.com/x.pdf",
                doc_type: "annual-report",
                period: "2023",
            })
            .await
            .unwrap();
        let page = store.upsert_page(doc.id, 1, "text").await.unwrap();
        store
            .insert_chunks_with_embeddings(vec![NewChunk {
                page_id: page.id,
                chunk_index: 0,
                content: content.to_string(),
                field_tag: None,
                vector: unit_vector(0),
            }])
            .await
            .unwrap();
    }

    let matches = store.knn(&unit_vector(0), &[project_a.id], 10).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].content, "a-content");
}
