//! Cancellation tokens and scan outcomes.
//!
//! Every long-running operation (index rebuild, pre-cache, statistics) takes
//! a [`CancellationToken`] and polls it once per folder and once per entry,
//! which bounds cancellation latency to roughly one directory enumeration.
//! A cancelled operation returns [`ScanOutcome::Cancelled`]; it is not an
//! error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation flag shared between a caller and a worker.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new, not yet cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once `cancel` has been called on any clone.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Result of a cancellable scan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ScanOutcome<T> {
    /// The scan ran to completion
    Completed(T),
    /// The scan observed cancellation and discarded its uncommitted work
    Cancelled,
}

impl<T> ScanOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScanOutcome::Cancelled)
    }

    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            ScanOutcome::Completed(value) => Some(value),
            ScanOutcome::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ScanOutcome<U> {
        match self {
            ScanOutcome::Completed(value) => ScanOutcome::Completed(f(value)),
            ScanOutcome::Cancelled => ScanOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_to_clones() {
        let token = CancellationToken::new();
        let worker = token.clone();
        token.cancel();
        assert!(worker.is_cancelled());
    }

    #[test]
    fn outcome_helpers() {
        let done = ScanOutcome::Completed(2).map(|v| v * 2);
        assert_eq!(done.clone().completed(), Some(4));
        assert!(!done.is_cancelled());

        let cancelled: ScanOutcome<u32> = ScanOutcome::Cancelled;
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.completed(), None);
    }
}
