use ledgerflow_core::Id;

use crate::error::{Result, StoreError};
use crate::models::{Document, DocumentPage};
use crate::store::Store;

pub struct NewDocument<'a> {
    pub project_id: Id,
    pub blob_url: &'a str,
    pub source_url: &'a str,
    pub doc_type: &'a str,
    pub period: &'a str,
}

impl Store {
    /// Created during the upload step; immutable thereafter except for
    /// `page_count`.
    pub async fn create_document(&self, doc: NewDocument<'_>) -> Result<Document> {
        sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (project_id, blob_url, source_url, doc_type, period)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, project_id, blob_url, source_url, doc_type, period, page_count, created_at
            "#,
        )
        .bind(doc.project_id)
        .bind(doc.blob_url)
        .bind(doc.source_url)
        .bind(doc.doc_type)
        .bind(doc.period)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    pub async fn list_documents_for_project(&self, project_id: Id) -> Result<Vec<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT id, project_id, blob_url, source_url, doc_type, period, page_count, created_at \
             FROM documents WHERE project_id = $1 ORDER BY created_at ASC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    pub async fn set_document_page_count(&self, document_id: Id, page_count: i32) -> Result<()> {
        sqlx::query("UPDATE documents SET page_count = $1 WHERE id = $2")
            .bind(page_count)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    /// Created during the text-extraction step; immutable. Idempotent
    /// under `(document_id, page_no)` so a step restarted after writing half
    /// its pages does not create duplicates on resume.
    pub async fn upsert_page(&self, document_id: Id, page_no: i32, text: &str) -> Result<DocumentPage> {
        sqlx::query_as::<_, DocumentPage>(
            r#"
            INSERT INTO document_pages (document_id, page_no, text)
            VALUES ($1, $2, $3)
            ON CONFLICT (document_id, page_no) DO UPDATE SET text = EXCLUDED.text
            RETURNING id, document_id, page_no, text, created_at
            "#,
        )
        .bind(document_id)
        .bind(page_no)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    pub async fn list_pages_for_document(&self, document_id: Id) -> Result<Vec<DocumentPage>> {
        sqlx::query_as::<_, DocumentPage>(
            "SELECT id, document_id, page_no, text, created_at FROM document_pages \
             WHERE document_id = $1 ORDER BY page_no ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }
}
