//! A minimal cooperative cancellation flag (§4.6 "Cancellation &
//! timeouts"): "propagates to C4 (stops at next tranche) and C5 (abandons
//! in-flight sequences after their current evaluation completes)".
//!
//! Plain `AtomicBool` rather than `tokio_util::sync::CancellationToken` —
//! the workspace doesn't otherwise depend on `tokio-util`, and a single
//! boolean flag checked at tranche boundaries is all §4.6 asks for.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_cloned_token_observes_cancellation() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
