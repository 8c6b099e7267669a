use ledgerflow_core::Id;

use crate::error::{Result, StoreError};
use crate::models::JobRow;
use crate::store::Store;

pub enum AcquireJobOutcome {
    Acquired(JobRow),
    Conflict,
}

impl Store {
    /// Attempts to insert a new job in `pending`; fails cleanly on the
    /// partial unique index rather than racing with whatever already holds
    /// the slot.
    pub async fn acquire_job_slot(&self, project_id: Id) -> Result<AcquireJobOutcome> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (short_id, project_id, status, total_steps)
            VALUES ($1, $2, 'pending', 8)
            ON CONFLICT DO NOTHING
            RETURNING id, short_id, project_id, status, current_step, current_step_index,
                      total_steps, last_successful_step, resume_payload, documents_processed,
                      embeddings_created, retry_count, can_resume, error_message, failed_step,
                      started_at, updated_at, completed_at, cancelled_at
            "#,
        )
        .bind(nanoid::nanoid!(8))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        // `ON CONFLICT DO NOTHING` with no target swallows any unique
        // violation, so a lost race surfaces as zero rows, not an error.
        match row {
            Some(row) => Ok(AcquireJobOutcome::Acquired(row)),
            None => Ok(AcquireJobOutcome::Conflict),
        }
    }

    pub async fn get_job(&self, id: Id) -> Result<JobRow> {
        sqlx::query_as::<_, JobRow>(Self::SELECT_JOB)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    /// The job currently holding the project's active slot, if any
    /// (status in pending/running).
    pub async fn get_active_job_for_project(&self, project_id: Id) -> Result<Option<JobRow>> {
        sqlx::query_as::<_, JobRow>(&format!(
            "{} WHERE project_id = $1 AND status IN ('pending', 'running') ORDER BY started_at DESC NULLS LAST LIMIT 1",
            Self::SELECT_JOB_NO_WHERE
        ))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    /// Most recent job overall, active or not — used for status summaries
    /// and to find the job a Resume call should act on.
    pub async fn get_latest_job_for_project(&self, project_id: Id) -> Result<Option<JobRow>> {
        sqlx::query_as::<_, JobRow>(&format!(
            "{} WHERE project_id = $1 ORDER BY updated_at DESC LIMIT 1",
            Self::SELECT_JOB_NO_WHERE
        ))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    pub async fn start_job(&self, id: Id) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'running', \
             started_at = COALESCE(started_at, now()), updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    /// Entering a step: records the current step and bumps `updated_at`.
    /// Also serves as the liveness heartbeat staleness recovery reads.
    pub async fn set_current_step(&self, id: Id, step: &str, step_index: i32) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET current_step = $1, current_step_index = $2, updated_at = now() WHERE id = $3",
        )
        .bind(step)
        .bind(step_index)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    /// Liveness heartbeat with no state change, used at cancellation
    /// check-points within long steps so a slow-but-alive job is never
    /// mistaken for a crashed one.
    pub async fn touch(&self, id: Id) -> Result<()> {
        sqlx::query("UPDATE jobs SET updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    /// Commits a step's outputs atomically: resume payload, step pointers,
    /// and counters move together or not at all.
    #[allow(clippy::too_many_arguments)]
    pub async fn complete_step(
        &self,
        id: Id,
        step: &str,
        next_step_index: i32,
        resume_payload: serde_json::Value,
        documents_processed: i32,
        embeddings_created: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET last_successful_step = $1,
                current_step_index = $2,
                resume_payload = $3,
                documents_processed = $4,
                embeddings_created = $5,
                updated_at = now()
            WHERE id = $6
            "#,
        )
        .bind(step)
        .bind(next_step_index)
        .bind(resume_payload)
        .bind(documents_processed)
        .bind(embeddings_created)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    pub async fn complete_job(&self, id: Id) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'completed', current_step = NULL, \
             completed_at = now(), updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    pub async fn fail_job(
        &self,
        id: Id,
        error_message: &str,
        failed_step: &str,
        can_resume: bool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed', error_message = $1, failed_step = $2,
                can_resume = $3, updated_at = now()
            WHERE id = $4
            "#,
        )
        .bind(error_message)
        .bind(failed_step)
        .bind(can_resume)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    /// Idempotent: only transitions jobs still in pending/running, so two
    /// cancels in quick succession leave the job in `cancelled` exactly
    /// once.
    pub async fn cancel_job(&self, id: Id) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'cancelled', cancelled_at = now(), can_resume = true, updated_at = now()
            WHERE id = $1 AND status IN ('pending', 'running')
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn increment_retry(&self, id: Id) -> Result<i32> {
        sqlx::query_scalar(
            "UPDATE jobs SET retry_count = retry_count + 1, updated_at = now() \
             WHERE id = $1 RETURNING retry_count",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    /// Re-opens a terminal-but-resumable job for another run, clearing the
    /// terminal timestamps so it reads as freshly started.
    pub async fn reopen_for_resume(&self, id: Id) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'running', cancelled_at = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    /// Staleness recovery: a `running` job whose `updated_at` is older than
    /// the threshold is considered crashed and coerced to `failed` with
    /// `failed_step = current_step` so it becomes eligible for a normal
    /// resume. Returns `true` if this job was coerced.
    pub async fn coerce_if_stale(&self, id: Id, threshold_secs: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed',
                failed_step = current_step,
                error_message = 'job coerced to failed: no progress within staleness threshold',
                can_resume = true,
                updated_at = now()
            WHERE id = $1
              AND status = 'running'
              AND updated_at < now() - make_interval(secs => $2)
            "#,
        )
        .bind(id)
        .bind(threshold_secs as f64)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    const SELECT_JOB_NO_WHERE: &'static str = r#"
        SELECT id, short_id, project_id, status, current_step, current_step_index,
               total_steps, last_successful_step, resume_payload, documents_processed,
               embeddings_created, retry_count, can_resume, error_message, failed_step,
               started_at, updated_at, completed_at, cancelled_at
        FROM jobs
    "#;

    const SELECT_JOB: &'static str = r#"
        SELECT id, short_id, project_id, status, current_step, current_step_index,
               total_steps, last_successful_step, resume_payload, documents_processed,
               embeddings_created, retry_count, can_resume, error_message, failed_step,
               started_at, updated_at, completed_at, cancelled_at
        FROM jobs
        WHERE id = $1
    "#;
}
