//! Cooperative cancellation for in-flight runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag a caller can raise to stop a run at the next stage boundary.
///
/// Clones observe the same flag, so the handle can be kept on one side of a
/// channel while the pipeline polls it on the other. Raising the signal never
/// interrupts a model call already in flight; the run checks it between
/// stages and finishes with the current draft.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    raised: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the run stop at the next stage boundary.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Reset the flag so the handle can be reused for another run.
    pub fn clear(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }
}
