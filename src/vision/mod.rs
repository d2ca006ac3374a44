pub mod frame;
pub mod hazard;

pub use frame::{FrameSlot, FrameSource};
pub use hazard::{HazardDetector, HazardReport};
