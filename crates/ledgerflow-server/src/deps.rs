use std::sync::Arc;

use ledgerflow_core::AppConfig;
use ledgerflow_events::ProgressBus;
use ledgerflow_executor::StepExecutor;
use ledgerflow_retrieval::RetrievalPipeline;
use ledgerflow_store::Store;

/// Central dependency container passed to every handler (mirrors the
/// teacher's `ServerDeps` — one struct cloned into each request rather than
/// threading the Store/ProgressBus/StepExecutor/RetrievalPipeline through
/// individually).
#[derive(Clone)]
pub struct AppDeps {
    pub store: Store,
    pub bus: Arc<ProgressBus>,
    pub executor: StepExecutor,
    pub retrieval: RetrievalPipeline,
    pub config: Arc<AppConfig>,
}

impl AppDeps {
    pub fn new(
        store: Store,
        bus: Arc<ProgressBus>,
        executor: StepExecutor,
        retrieval: RetrievalPipeline,
        config: Arc<AppConfig>,
    ) -> Self {
        Self { store, bus, executor, retrieval, config }
    }
}
