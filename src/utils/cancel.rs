//! Cancellation utilities
//!
//! Provides a first-class cancellation handle for long-running orchestrations.

use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
///
/// Clones share the same underlying signal, so one handle can be given to the
/// orchestrator while another stays with the caller.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a fresh, not-yet-cancelled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. A run observing this handle stops at the next
    /// transport exchange and returns the steps completed so far.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_the_signal() {
        let handle = CancelHandle::new();
        let observer = handle.clone();
        assert!(!observer.is_cancelled());

        handle.cancel();
        observer.cancelled().await;
        assert!(observer.is_cancelled());
    }
}
