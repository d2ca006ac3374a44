pub mod reconciler;
pub mod state;

pub use reconciler::Reconciler;
pub use state::{Button, DeviceState, Trigger};
