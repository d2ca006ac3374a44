pub mod flags;
pub mod modes;
pub mod monitor;

pub use flags::SafetyFlags;
pub use modes::{Mode, ModeSwitch};
pub use monitor::{HotKey, KeyQuery, SafetyMonitor};
