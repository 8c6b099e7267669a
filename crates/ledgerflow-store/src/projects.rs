use ledgerflow_core::Id;

use crate::error::{Result, StoreError};
use crate::models::{Project, ProjectRow, ProjectState};
use crate::store::Store;

/// Outcome of `CreateProjectIfAbsent`.
pub enum CreateProjectOutcome {
    Created(Project),
    AlreadyExists,
}

impl Store {
    /// Atomically inserts a project, or reports the uniqueness conflict —
    /// a project's source URL is globally unique.
    pub async fn create_project_if_absent(
        &self,
        url: &str,
        display_name: &str,
    ) -> Result<CreateProjectOutcome> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO projects (url, display_name, state)
            VALUES ($1, $2, 'pending')
            ON CONFLICT (url) DO NOTHING
            RETURNING id, url, display_name, state, error, created_at, updated_at
            "#,
        )
        .bind(url)
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        match row {
            Some(row) => Ok(CreateProjectOutcome::Created(row.into())),
            None => Ok(CreateProjectOutcome::AlreadyExists),
        }
    }

    pub async fn get_project(&self, id: Id) -> Result<Project> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, url, display_name, state, error, created_at, updated_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(row.into())
    }

    /// Most-recent-first paginated listing.
    pub async fn list_projects(&self, skip: i64, limit: i64) -> Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, url, display_name, state, error, created_at, updated_at
            FROM projects
            ORDER BY created_at DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn update_project_state(
        &self,
        id: Id,
        state: ProjectState,
        error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE projects SET state = $1, error = $2, updated_at = now() WHERE id = $3",
        )
        .bind(state.as_str())
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(())
    }

    /// Cascades to all descendants, enforced by the foreign-key
    /// `ON DELETE CASCADE` chain in the schema, not by application code.
    pub async fn delete_project(&self, id: Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("project {id} not found")));
        }
        Ok(())
    }
}
