//! Cooperative cancellation
//!
//! SPEC_FULL.md §5/§7: a repository build can be cancelled mid-flight.
//! `ParseDriver` checks a `CancellationToken` at every file dispatch and
//! every `Translate` primitive call so an in-progress file aborts promptly
//! instead of running to completion after the caller has moved on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cheap to clone, shared across every worker thread fanning out over a
/// repository's files (spec.md §5).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_is_shared_across_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
