pub mod arbitrator;
pub mod control_loop;
pub mod state;

pub use arbitrator::{Action, Arbitrator, Layer, UserAction};
pub use state::{AgentSnapshot, AgentState, SharedAgentState};
