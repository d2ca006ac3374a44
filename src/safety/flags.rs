use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Process-wide safety state. Written only by the safety monitor, read at
/// the top of every control tick and by the reconciler before every
/// setter. `paused` is a plain atomic; termination rides the cancellation
/// token so every task can `select!` on it.
pub struct SafetyFlags {
    paused: AtomicBool,
    shutdown: CancellationToken,
}

impl SafetyFlags {
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// False once the kill switch has fired. One-way.
    pub fn is_active(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    pub fn kill(&self) {
        self.shutdown.cancel();
    }

    /// Token the background tasks park on for cooperative shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_safe_to_operate(&self) -> bool {
        self.is_active() && !self.is_paused()
    }
}

impl Default for SafetyFlags {
    fn default() -> Self {
        Self::new()
    }
}
