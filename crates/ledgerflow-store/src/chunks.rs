use ledgerflow_core::Id;
use pgvector::Vector;

use crate::error::{Result, StoreError};
use crate::models::{KnnMatch, NewChunk, TextChunk};
use crate::store::Store;

impl Store {
    /// Inserts a batch of chunks and their embeddings for one page in a
    /// single transaction — an embedding only ever exists alongside its
    /// chunk, so the commit is atomic and a crash mid-batch leaves neither
    /// half visible. Idempotent under `(page_id, chunk_index)`.
    pub async fn insert_chunks_with_embeddings(&self, chunks: Vec<NewChunk>) -> Result<Vec<TextChunk>> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from_sqlx)?;
        let mut out = Vec::with_capacity(chunks.len());

        for c in chunks {
            let dim = c.vector.len();
            if dim != ledgerflow_core::EMBEDDING_DIM {
                return Err(StoreError::ValidationFailed(format!(
                    "embedding dimension {dim} does not match expected {}",
                    ledgerflow_core::EMBEDDING_DIM
                )));
            }

            let row = sqlx::query_as::<_, TextChunk>(
                r#"
                INSERT INTO text_chunks (page_id, chunk_index, content, field_tag)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (page_id, chunk_index)
                    DO UPDATE SET content = EXCLUDED.content, field_tag = EXCLUDED.field_tag
                RETURNING id, page_id, chunk_index, content, field_tag, created_at
                "#,
            )
            .bind(c.page_id)
            .bind(c.chunk_index)
            .bind(&c.content)
            .bind(&c.field_tag)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

            let vector = Vector::from(c.vector);
            sqlx::query(
                "INSERT INTO embeddings (chunk_id, vector) VALUES ($1, $2) \
                 ON CONFLICT (chunk_id) DO UPDATE SET vector = EXCLUDED.vector",
            )
            .bind(row.id)
            .bind(vector)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

            out.push(row);
        }

        tx.commit().await.map_err(StoreError::from_sqlx)?;
        Ok(out)
    }

    /// Count of chunks already embedded for a page — lets a restarted step
    /// skip work it already completed.
    pub async fn count_chunks_for_page(&self, page_id: Id) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM text_chunks WHERE page_id = $1")
            .bind(page_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    pub async fn count_embeddings_for_project(&self, project_id: Id) -> Result<i64> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM embeddings e
            JOIN text_chunks tc ON tc.id = e.chunk_id
            JOIN document_pages dp ON dp.id = tc.page_id
            JOIN documents d ON d.id = dp.document_id
            WHERE d.project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    /// Cosine-distance nearest-neighbour search, restricted to the supplied
    /// project set, ordered ascending by distance with chunk-id tie-break
    /// for determinism. An empty project set is rejected rather than
    /// silently returning global results.
    pub async fn knn(&self, query_vector: &[f32], project_ids: &[Id], k: i64) -> Result<Vec<KnnMatch>> {
        if project_ids.is_empty() {
            return Err(StoreError::ValidationFailed(
                "KNN requires a non-empty project id set".into(),
            ));
        }
        if query_vector.len() != ledgerflow_core::EMBEDDING_DIM {
            return Err(StoreError::ValidationFailed(format!(
                "query vector dimension {} does not match expected {}",
                query_vector.len(),
                ledgerflow_core::EMBEDDING_DIM
            )));
        }

        let ids: Vec<uuid::Uuid> = project_ids.iter().map(|id| id.0).collect();
        let vector = Vector::from(query_vector.to_vec());

        sqlx::query_as::<_, KnnMatch>(
            r#"
            SELECT
                tc.id AS chunk_id,
                tc.content AS content,
                dp.page_no AS page_no,
                d.doc_type AS doc_type,
                d.period AS period,
                p.display_name AS company,
                tc.field_tag AS field_tag,
                (e.vector <=> $1) AS distance
            FROM embeddings e
            JOIN text_chunks tc ON tc.id = e.chunk_id
            JOIN document_pages dp ON dp.id = tc.page_id
            JOIN documents d ON d.id = dp.document_id
            JOIN projects p ON p.id = d.project_id
            WHERE d.project_id = ANY($2)
            ORDER BY distance ASC, tc.id ASC
            LIMIT $3
            "#,
        )
        .bind(vector)
        .bind(&ids)
        .bind(k)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }
}
