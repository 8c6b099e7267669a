use std::collections::HashMap;
use std::sync::Mutex;

use ledgerflow_core::Id;
use tokio_util::sync::CancellationToken;

/// The per-job cancellation flag map. Narrow,
/// lock-protected, and deterministic: a job's token is created lazily on
/// first access and dropped once the job reaches a terminal state, so the
/// map never grows unbounded.
#[derive(Default, Clone)]
pub struct CancellationRegistry {
    tokens: std::sync::Arc<Mutex<HashMap<Id, CancellationToken>>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the token for `job_id`, creating one if this is the first
    /// time the job has been seen.
    pub fn token_for(&self, job_id: Id) -> CancellationToken {
        let mut tokens = self.tokens.lock().expect("cancellation registry mutex poisoned");
        tokens.entry(job_id).or_default().clone()
    }

    /// Sets the flag bound to `job_id`, if one exists. A job that has never
    /// been started (no token yet) has nothing to cancel.
    pub fn cancel(&self, job_id: Id) {
        let tokens = self.tokens.lock().expect("cancellation registry mutex poisoned");
        if let Some(token) = tokens.get(&job_id) {
            token.cancel();
        }
    }

    /// Drops the token once a job has reached a terminal state, so a
    /// subsequent resume starts from a fresh, uncancelled token.
    pub fn clear(&self, job_id: Id) {
        let mut tokens = self.tokens.lock().expect("cancellation registry mutex poisoned");
        tokens.remove(&job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_before_any_subscribe_is_a_no_op() {
        let registry = CancellationRegistry::new();
        registry.cancel(Id::new());
    }

    #[test]
    fn token_observes_cancel() {
        let registry = CancellationRegistry::new();
        let job_id = Id::new();
        let token = registry.token_for(job_id);
        assert!(!token.is_cancelled());
        registry.cancel(job_id);
        assert!(token.is_cancelled());
    }

    #[test]
    fn clear_resets_to_a_fresh_token() {
        let registry = CancellationRegistry::new();
        let job_id = Id::new();
        registry.cancel(job_id); // no-op, no token yet
        let token = registry.token_for(job_id);
        assert!(!token.is_cancelled());

        registry.cancel(job_id);
        assert!(token.is_cancelled());

        registry.clear(job_id);
        let fresh = registry.token_for(job_id);
        assert!(!fresh.is_cancelled());
    }
}
