use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::{Result, StoreError};

/// Typed persistence over the ingestion data model. Wraps a Postgres pool;
/// every public method maps its own `sqlx::Error`s into the `StoreError`
/// kinds promised by the Store contract.
#[derive(Clone)]
pub struct Store {
    pub(crate) pool: PgPool,
}

impl Store {
    /// Connect, run migrations, and verify the `vector` extension and its
    /// ANN index are present. The index is a correctness-critical artefact;
    /// its absence is a startup-time error, not a degraded mode.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await
            .map_err(StoreError::from_sqlx)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))?;

        let store = Self { pool };
        store.verify_ann_index().await?;
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn verify_ann_index(&self) -> Result<()> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pg_indexes WHERE indexname = 'embeddings_vector_idx')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        if !exists {
            return Err(StoreError::Unavailable(
                "embeddings_vector_idx ANN index is missing".into(),
            ));
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
