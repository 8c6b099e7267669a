use std::sync::Arc;

use ledgerflow_core::{AppConfig, Id, IngestError};
use ledgerflow_events::{CloseReason, Counters, Event, ProgressBus};
use ledgerflow_providers::Providers;
use ledgerflow_store::{AcquireJobOutcome, JobRow, JobStatus, Store};
use tracing::{error, info, warn};

use crate::cancellation::CancellationRegistry;
use crate::context::StepContext;
use crate::payload::ResumePayload;
use crate::steps::{all_steps, STEP_NAMES, TOTAL_STEPS};

/// Drives the fixed eight-step pipeline for a project's job, start to
/// finish or start to first failure. Holds no per-job state itself beyond
/// the cancellation registry — everything else lives in the Store row a
/// given job id names.
#[derive(Clone)]
pub struct StepExecutor {
    store: Store,
    bus: Arc<ProgressBus>,
    providers: Arc<Providers>,
    config: Arc<AppConfig>,
    cancellations: CancellationRegistry,
}

impl StepExecutor {
    pub fn new(store: Store, bus: Arc<ProgressBus>, providers: Arc<Providers>, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            bus,
            providers,
            config,
            cancellations: CancellationRegistry::new(),
        }
    }

    /// Starts a fresh job for `project_id`. Fails with `Conflict` if the
    /// project already holds its one active-job slot; the caller does not
    /// await completion, the pipeline runs in the background and reports
    /// through the ProgressBus.
    pub async fn start(&self, project_id: Id) -> Result<Id, IngestError> {
        let project = self.store.get_project(project_id).await?;

        match self.store.acquire_job_slot(project_id).await? {
            AcquireJobOutcome::Acquired(job) => {
                let job_id = job.id;
                self.spawn_run(job_id, project_id, project.url);
                Ok(job_id)
            }
            AcquireJobOutcome::Conflict => Err(IngestError::Conflict(format!(
                "project {project_id} already has an active job"
            ))),
        }
    }

    /// Resumes the project's most recent job. A job with no prior run
    /// falls back to `start`. A `completed` job cannot be resumed. A
    /// `running` job is resumed only after it is found stale; otherwise
    /// this is a conflict. A terminal, resumable job reopens and continues
    /// from `last_successful_step + 1`.
    pub async fn resume(&self, project_id: Id) -> Result<Id, IngestError> {
        let Some(mut job) = self.store.get_latest_job_for_project(project_id).await? else {
            return self.start(project_id).await;
        };

        let mut status = JobStatus::parse(&job.status);

        if matches!(status, JobStatus::Pending | JobStatus::Running) {
            if status == JobStatus::Running && self.store.coerce_if_stale(job.id, self.config.stale_job_threshold_secs).await? {
                job = self.store.get_job(job.id).await?;
                status = JobStatus::parse(&job.status);
            } else {
                return Err(IngestError::Conflict(format!("job {} is already active", job.id)));
            }
        }

        match status {
            JobStatus::Completed => Err(IngestError::ValidationFailed(format!(
                "job {} has already completed",
                job.id
            ))),
            JobStatus::Pending | JobStatus::Running => unreachable!("handled above"),
            JobStatus::Failed | JobStatus::Cancelled => {
                if !job.can_resume {
                    return Err(IngestError::ValidationFailed(format!(
                        "job {} is not resumable",
                        job.id
                    )));
                }

                let retry_count = self.store.increment_retry(job.id).await?;
                if retry_count > self.config.max_retries as i32 {
                    warn!(job_id = %job.id, retry_count, max_retries = self.config.max_retries, "job exceeded configured retry budget, proceeding anyway");
                    self.bus.publish(
                        job.id,
                        Event::Detail {
                            step: job.current_step.clone().unwrap_or_default(),
                            counters: Counters {
                                documents_processed: job.documents_processed,
                                embeddings_created: job.embeddings_created,
                            },
                            message: format!("retry {retry_count} exceeds configured maximum of {}", self.config.max_retries),
                        },
                    );
                }

                let project = self.store.get_project(project_id).await?;
                self.store.reopen_for_resume(job.id).await?;
                self.spawn_run(job.id, project_id, project.url);
                Ok(job.id)
            }
        }
    }

    /// Requests cancellation of a job's cooperative token. Takes effect at
    /// the next checkpoint, not synchronously.
    pub fn cancel(&self, job_id: Id) {
        self.cancellations.cancel(job_id);
    }

    fn spawn_run(&self, job_id: Id, project_id: Id, project_url: String) {
        let executor = self.clone();
        tokio::spawn(async move {
            if let Err(err) = executor.run(job_id, project_id, project_url).await {
                error!(job_id = %job_id, error = %err, "job run ended with an unhandled error");
            }
        });
    }

    async fn run(&self, job_id: Id, project_id: Id, project_url: String) -> Result<(), IngestError> {
        self.store.start_job(job_id).await?;

        let job = self.store.get_job(job_id).await?;
        let start_index = start_index_for(&job);
        let mut payload: ResumePayload = job.resume_payload();

        let token = self.cancellations.token_for(job_id);
        let ctx = StepContext::new(
            job_id,
            project_id,
            project_url,
            self.store.clone(),
            self.bus.clone(),
            self.providers.clone(),
            self.config.clone(),
            token,
            job.documents_processed,
            job.embeddings_created,
        );

        let steps = all_steps();

        for step_index in start_index..steps.len() {
            if ctx.check_cancelled().is_err() {
                return self.finish_cancelled(job_id, STEP_NAMES[step_index]).await;
            }

            let step = &steps[step_index];
            self.store.set_current_step(job_id, step.name(), step_index as i32).await?;

            match step.run(&ctx, step_index as i32, &mut payload).await {
                Ok(()) => {
                    let (documents_processed, embeddings_created) = ctx.counters();
                    let resume_json = serde_json::to_value(&payload)
                        .map_err(|e| IngestError::Internal(format!("resume payload not serializable: {e}")))?;

                    self.store
                        .complete_step(
                            job_id,
                            step.name(),
                            (step_index + 1) as i32,
                            resume_json,
                            documents_processed,
                            embeddings_created,
                        )
                        .await?;

                    self.bus.publish(
                        job_id,
                        Event::Detail {
                            step: step.name().to_string(),
                            counters: Counters {
                                documents_processed,
                                embeddings_created,
                            },
                            message: format!("completed {}", step.name()),
                        },
                    );
                }
                Err(IngestError::Cancelled) => {
                    return self.finish_cancelled(job_id, step.name()).await;
                }
                Err(err) => {
                    return self.finish_failed(job_id, step.name(), err).await;
                }
            }
        }

        self.store.complete_job(job_id).await?;
        info!(job_id = %job_id, "job completed");
        self.bus.publish(
            job_id,
            Event::Completed {
                message: "ingestion completed".to_string(),
            },
        );
        self.bus.close(job_id, CloseReason::Completed);
        self.cancellations.clear(job_id);
        Ok(())
    }

    async fn finish_cancelled(&self, job_id: Id, step: &str) -> Result<(), IngestError> {
        self.store.cancel_job(job_id).await?;
        info!(job_id = %job_id, step, "job cancelled");
        self.bus.publish(
            job_id,
            Event::Cancelled {
                message: format!("cancelled during {step}"),
            },
        );
        self.bus.close(job_id, CloseReason::Cancelled);
        self.cancellations.clear(job_id);
        Ok(())
    }

    async fn finish_failed(&self, job_id: Id, step: &str, err: IngestError) -> Result<(), IngestError> {
        let can_resume = !err.is_fatal_for_step();
        let message = err.to_string();
        warn!(job_id = %job_id, step, can_resume, error = %message, "job step failed");

        self.store.fail_job(job_id, &message, step, can_resume).await?;
        self.bus.publish(
            job_id,
            Event::Error {
                step: step.to_string(),
                message,
            },
        );
        self.bus.close(job_id, CloseReason::Error);
        self.cancellations.clear(job_id);
        Ok(())
    }
}

/// The index to resume from: one past whatever step last committed
/// successfully, or the first step for a job that never completed one.
fn start_index_for(job: &JobRow) -> usize {
    match &job.last_successful_step {
        Some(name) => STEP_NAMES
            .iter()
            .position(|s| s == name)
            .map(|i| i + 1)
            .unwrap_or(0)
            .min(TOTAL_STEPS as usize),
        None => 0,
    }
}
