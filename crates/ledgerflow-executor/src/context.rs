use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use ledgerflow_core::{AppConfig, Id, IngestError};
use ledgerflow_events::{Event, ProgressBus};
use ledgerflow_providers::Providers;
use ledgerflow_store::Store;
use tokio_util::sync::CancellationToken;

use crate::steps::{STEP_NAMES, TOTAL_STEPS};

/// Everything one step invocation needs: the Store/ProgressBus/Providers
/// handles, this job's identity, its cancellation token, and the running
/// counters a step contributes to.
pub struct StepContext {
    pub job_id: Id,
    pub project_id: Id,
    pub project_url: String,
    pub store: Store,
    pub bus: Arc<ProgressBus>,
    pub providers: Arc<Providers>,
    pub config: Arc<AppConfig>,
    cancellation: CancellationToken,
    documents_processed: AtomicI32,
    embeddings_created: AtomicI32,
}

impl StepContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_id: Id,
        project_id: Id,
        project_url: String,
        store: Store,
        bus: Arc<ProgressBus>,
        providers: Arc<Providers>,
        config: Arc<AppConfig>,
        cancellation: CancellationToken,
        documents_processed: i32,
        embeddings_created: i32,
    ) -> Self {
        Self {
            job_id,
            project_id,
            project_url,
            store,
            bus,
            providers,
            config,
            cancellation,
            documents_processed: AtomicI32::new(documents_processed),
            embeddings_created: AtomicI32::new(embeddings_created),
        }
    }

    /// Cancellation checkpoint: called between steps by the executor
    /// and within long steps (per-document/per-batch) by the steps
    /// themselves.
    pub fn check_cancelled(&self) -> Result<(), IngestError> {
        if self.cancellation.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        Ok(())
    }

    pub fn add_documents_processed(&self, n: i32) {
        self.documents_processed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_embeddings_created(&self, n: i32) {
        self.embeddings_created.fetch_add(n, Ordering::Relaxed);
    }

    pub fn counters(&self) -> (i32, i32) {
        (
            self.documents_processed.load(Ordering::Relaxed),
            self.embeddings_created.load(Ordering::Relaxed),
        )
    }

    pub fn emit_status(&self, step_index: i32, message: impl Into<String>) {
        self.bus.publish(
            self.job_id,
            Event::Status {
                step: STEP_NAMES[step_index as usize].to_string(),
                step_index,
                total_steps: TOTAL_STEPS,
                message: message.into(),
            },
        );
    }

    pub fn emit_progress(&self, step_index: i32, message: impl Into<String>) {
        self.bus.publish(
            self.job_id,
            Event::Progress {
                step: STEP_NAMES[step_index as usize].to_string(),
                step_index,
                total_steps: TOTAL_STEPS,
                message: message.into(),
            },
        );
    }
}
