use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Run-scoped cancellation flag, cloned into every worker.
///
/// Checked at the top of each pagination iteration and before each retry
/// sleep, so an in-flight multi-page fetch stops promptly instead of
/// running its budget to exhaustion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
