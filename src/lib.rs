pub mod core;
pub mod device;
pub mod intake;
pub mod perception;
pub mod planner;
pub mod safety;
pub mod skills;
pub mod vision;

// Re-export the most commonly wired pieces for convenient access
pub use crate::core::control_loop::ControlLoop;
pub use crate::device::reconciler::Reconciler;
pub use crate::safety::flags::SafetyFlags;
