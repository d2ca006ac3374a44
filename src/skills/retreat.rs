use tracing::warn;

use crate::device::reconciler::Reconciler;

/// Reflex retreat: full backward on the move stick. `tick` is idempotent
/// and safe to call every hazard frame; `stop` must be called exactly
/// once when the hazard clears, not every idle tick, so it cannot clobber
/// another skill's movement output.
pub struct RetreatBehavior;

impl RetreatBehavior {
    pub fn new() -> Self {
        Self
    }

    pub fn tick(&self, reconciler: &mut Reconciler) {
        // -1.0 on Y is backward (standard XInput).
        reconciler.set_move(0.0, -1.0);
    }

    pub fn stop(&self, reconciler: &mut Reconciler) {
        warn!("hazard cleared, stopping retreat");
        reconciler.set_move(0.0, 0.0);
    }
}

impl Default for RetreatBehavior {
    fn default() -> Self {
        Self::new()
    }
}
