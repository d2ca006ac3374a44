use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::core::state::SharedAgentState;
use crate::planner::PlannerClient;
use crate::safety::flags::SafetyFlags;

/// Classified operator console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Stop,
    Goal(String),
    Unknown(String),
}

/// Pure classification of one console line.
pub fn classify(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if line.eq_ignore_ascii_case("stop") {
        return Command::Stop;
    }
    let lower = line.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("goal:") {
        // Preserve the operator's original casing for the goal text.
        let goal = line[line.len() - rest.len()..].trim().to_string();
        return Command::Goal(goal);
    }
    Command::Unknown(line.to_string())
}

/// Line-oriented operator channel over stdin. This task is the only
/// consumer of stdin and waits on one line at a time. It talks to the
/// rest of the system only through the AgentState snapshot and the plan
/// channel, never shared mutable state.
pub struct CommandIntake {
    agent: SharedAgentState,
    planner: PlannerClient,
    plan_tx: mpsc::Sender<Vec<String>>,
    flags: std::sync::Arc<SafetyFlags>,
}

impl CommandIntake {
    pub fn new(
        agent: SharedAgentState,
        planner: PlannerClient,
        plan_tx: mpsc::Sender<Vec<String>>,
        flags: std::sync::Arc<SafetyFlags>,
    ) -> Self {
        Self {
            agent,
            planner,
            plan_tx,
            flags,
        }
    }

    pub async fn run(self) {
        info!("command intake ready: `goal: <text>` or `stop`");
        let shutdown = self.flags.shutdown_token();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => line,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => break, // EOF
                Err(e) => {
                    warn!("console read failed: {e}");
                    break;
                }
            };

            match classify(&line) {
                Command::Empty => {}
                Command::Stop => {
                    info!("command intake stopping");
                    break;
                }
                Command::Goal(goal) => self.handle_goal(&goal).await,
                Command::Unknown(cmd) => {
                    warn!("unrecognized command `{cmd}`; try `goal: <text>` or `stop`")
                }
            }
        }
        info!("command intake stopped");
    }

    /// Hand the goal to the external planner with a state snapshot, then
    /// forward the resulting steps to the control loop. A planner failure
    /// costs one log line and nothing else.
    async fn handle_goal(&self, goal: &str) {
        info!("goal received: {goal}");
        let snapshot = self.agent.snapshot();
        match self.planner.plan(goal, &snapshot).await {
            Ok(steps) => {
                info!("plan received: {} step(s)", steps.len());
                if self.plan_tx.send(steps).await.is_err() {
                    warn!("control loop gone, dropping plan");
                }
            }
            Err(e) => warn!("planner failed for goal `{goal}`: {e}"),
        }
    }
}
