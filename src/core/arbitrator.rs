/// Reflex-layer proposals. Only the hazard classifier feeds this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflexAction {
    Retreat,
}

/// User-layer proposals: operator-toggled mode behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Combat,
    Fishing,
}

/// The winning action the control loop executes this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Retreat,
    User(UserAction),
    Plan(String),
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Reflex,
    User,
    Plan,
    Idle,
}

impl Layer {
    pub fn priority(self) -> u8 {
        match self {
            Layer::Reflex => 100,
            Layer::User => 50,
            Layer::Plan => 10,
            Layer::Idle => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Reflex => "REFLEX",
            Layer::User => "USER",
            Layer::Plan => "PLAN",
            Layer::Idle => "IDLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub layer: Layer,
}

/// Fixed-priority proposal selection: reflex > user > plan > idle.
/// Memoryless across ticks; every call re-evaluates from scratch, and the
/// recorded winner is diagnostics only, with no effect on future
/// decisions.
pub struct Arbitrator {
    last_layer: Layer,
    last_priority: u8,
}

impl Arbitrator {
    pub fn new() -> Self {
        Self {
            last_layer: Layer::Idle,
            last_priority: 0,
        }
    }

    pub fn decide(
        &mut self,
        reflex: Option<ReflexAction>,
        user: Option<UserAction>,
        plan: Option<&str>,
    ) -> Decision {
        let decision = if let Some(ReflexAction::Retreat) = reflex {
            Decision {
                action: Action::Retreat,
                layer: Layer::Reflex,
            }
        } else if let Some(action) = user {
            Decision {
                action: Action::User(action),
                layer: Layer::User,
            }
        } else if let Some(step) = plan {
            Decision {
                action: Action::Plan(step.to_string()),
                layer: Layer::Plan,
            }
        } else {
            Decision {
                action: Action::Idle,
                layer: Layer::Idle,
            }
        };

        self.last_layer = decision.layer;
        self.last_priority = decision.layer.priority();
        decision
    }

    /// Last winning layer, for diagnostics / the status line.
    pub fn active_layer(&self) -> Layer {
        self.last_layer
    }

    pub fn current_priority(&self) -> u8 {
        self.last_priority
    }
}

impl Default for Arbitrator {
    fn default() -> Self {
        Self::new()
    }
}
