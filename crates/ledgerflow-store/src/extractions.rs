use ledgerflow_core::Id;

use crate::error::{Result, StoreError};
use crate::models::{CompanySnapshot, ExtractionResult};
use crate::store::Store;

impl Store {
    pub async fn insert_extraction_result(
        &self,
        document_id: Id,
        data: serde_json::Value,
        citations: Option<serde_json::Value>,
        reasoning: Option<&str>,
    ) -> Result<ExtractionResult> {
        sqlx::query_as::<_, ExtractionResult>(
            r#"
            INSERT INTO extraction_results (document_id, data, citations, reasoning)
            VALUES ($1, $2, $3, $4)
            RETURNING id, document_id, data, citations, reasoning, created_at
            "#,
        )
        .bind(document_id)
        .bind(data)
        .bind(citations)
        .bind(reasoning)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    pub async fn get_extraction_result_for_document(
        &self,
        document_id: Id,
    ) -> Result<Option<ExtractionResult>> {
        sqlx::query_as::<_, ExtractionResult>(
            "SELECT id, document_id, data, citations, reasoning, created_at \
             FROM extraction_results WHERE document_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    /// Always creates a new row with `version` one greater than the current
    /// max. Prior rows are left untouched.
    pub async fn insert_snapshot(
        &self,
        project_id: Id,
        data: serde_json::Value,
    ) -> Result<CompanySnapshot> {
        sqlx::query_as::<_, CompanySnapshot>(
            r#"
            INSERT INTO company_snapshots (project_id, version, data)
            VALUES (
                $1,
                COALESCE((SELECT MAX(version) FROM company_snapshots WHERE project_id = $1), 0) + 1,
                $2
            )
            RETURNING project_id, version, data, created_at
            "#,
        )
        .bind(project_id)
        .bind(data)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    pub async fn get_latest_snapshot(&self, project_id: Id) -> Result<Option<CompanySnapshot>> {
        sqlx::query_as::<_, CompanySnapshot>(
            "SELECT project_id, version, data, created_at FROM company_snapshots \
             WHERE project_id = $1 ORDER BY version DESC LIMIT 1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }
}
