use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Last-known agent status. Position comes from the OCR bridge and may be
/// stale; readers must treat it as best-effort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentState {
    pub position: (i32, i32, i32),
    pub health: f32,
    pub hunger: f32,
    pub alive: bool,
    pub active_task: String,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            position: (0, 0, 0),
            health: 20.0,
            hunger: 20.0,
            alive: true,
            active_task: "IDLE".to_string(),
        }
    }
}

/// Owned snapshot handed to the planner and the status line.
pub type AgentSnapshot = AgentState;

/// Explicitly constructed shared container, passed to every component
/// that needs it at startup. Exclusive-write / shared-read via the inner
/// mutex; writers are the OCR bridge and the health updater, readers are
/// skills, intake, and the status line.
#[derive(Clone)]
pub struct SharedAgentState {
    inner: Arc<Mutex<AgentState>>,
}

impl SharedAgentState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(AgentState::default())),
        }
    }

    pub fn update_position(&self, pos: (i32, i32, i32)) {
        self.lock().position = pos;
    }

    pub fn update_health(&self, health: f32) {
        let mut state = self.lock();
        state.health = health;
        if state.health <= 0.0 {
            state.alive = false;
        }
    }

    pub fn update_hunger(&self, hunger: f32) {
        self.lock().hunger = hunger;
    }

    pub fn set_active_task(&self, task: &str) {
        self.lock().active_task = task.to_string();
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        self.lock().clone()
    }

    /// Back to freshly-constructed defaults, on demand.
    pub fn reset(&self) {
        *self.lock() = AgentState::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AgentState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for SharedAgentState {
    fn default() -> Self {
        Self::new()
    }
}
