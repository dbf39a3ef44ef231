//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag the host can raise to abort a run.
///
/// The indexing loop polls it between sequences and the match engine polls
/// it between buckets; a raised flag surfaces as
/// [`VelellaError::Cancelled`](crate::VelellaError::Cancelled). There are no
/// per-operation timeouts.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }

    /// Return `Err(Cancelled)` if the flag has been raised.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            Err(crate::VelellaError::Cancelled)
        } else {
            Ok(())
        }
    }
}
