// src/core/cancellation.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide cooperative cancellation flag.
///
/// Cheap to clone (an `Arc<AtomicBool>` underneath) and safe to share across
/// sieve worker threads: each worker polls `is_cancelled()` between
/// polynomials and drains quickly once it observes `true`.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Expose the underlying flag for code that wants to hand it to a
    /// `ctrlc::set_handler` callback or similar.
    pub fn shared_flag(&self) -> Arc<AtomicBool> {
        self.flag.clone()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_latches() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
