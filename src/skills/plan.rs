use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::device::reconciler::Reconciler;
use crate::device::state::{Button, Trigger};

/// Skill names the planner is allowed to emit, advertised in the plan
/// request.
pub const AVAILABLE_SKILLS: &[&str] = &[
    "MOVE_FORWARD",
    "MOVE_BACKWARD",
    "JUMP",
    "ATTACK",
    "LOOK_AROUND",
    "WAIT",
];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PlanStepError {
    #[error("empty plan step")]
    Empty,
    #[error("unknown skill `{0}`")]
    UnknownSkill(String),
    #[error("bad argument `{arg}` for {skill}: expected a number")]
    BadArgument { skill: &'static str, arg: String },
}

/// Closed set of primitive skill invocations. Plan steps arrive as
/// `NAME [seconds]` strings and are validated per step; one malformed
/// step never aborts the rest of the plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkillCommand {
    MoveForward { secs: f32 },
    MoveBackward { secs: f32 },
    Jump,
    Attack { secs: f32 },
    LookAround,
    Wait { secs: f32 },
}

impl SkillCommand {
    /// Parse one plan step. Skill names are case-insensitive; durations
    /// default to one second.
    pub fn parse(step: &str) -> Result<Self, PlanStepError> {
        let mut parts = step.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(PlanStepError::Empty);
        };

        let name_upper = name.to_ascii_uppercase();
        let secs_arg = |skill: &'static str,
                        parts: &mut std::str::SplitWhitespace<'_>|
         -> Result<f32, PlanStepError> {
            match parts.next() {
                None => Ok(1.0),
                Some(raw) => raw.parse::<f32>().map_err(|_| PlanStepError::BadArgument {
                    skill,
                    arg: raw.to_string(),
                }),
            }
        };

        match name_upper.as_str() {
            "MOVE_FORWARD" => Ok(SkillCommand::MoveForward {
                secs: secs_arg("MOVE_FORWARD", &mut parts)?,
            }),
            "MOVE_BACKWARD" => Ok(SkillCommand::MoveBackward {
                secs: secs_arg("MOVE_BACKWARD", &mut parts)?,
            }),
            "JUMP" => Ok(SkillCommand::Jump),
            "ATTACK" => Ok(SkillCommand::Attack {
                secs: secs_arg("ATTACK", &mut parts)?,
            }),
            "LOOK_AROUND" => Ok(SkillCommand::LookAround),
            "WAIT" => Ok(SkillCommand::Wait {
                secs: secs_arg("WAIT", &mut parts)?,
            }),
            _ => Err(PlanStepError::UnknownSkill(name.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkillCommand::MoveForward { .. } => "MOVE_FORWARD",
            SkillCommand::MoveBackward { .. } => "MOVE_BACKWARD",
            SkillCommand::Jump => "JUMP",
            SkillCommand::Attack { .. } => "ATTACK",
            SkillCommand::LookAround => "LOOK_AROUND",
            SkillCommand::Wait { .. } => "WAIT",
        }
    }

    fn duration(&self) -> Duration {
        let secs = match self {
            SkillCommand::MoveForward { secs }
            | SkillCommand::MoveBackward { secs }
            | SkillCommand::Attack { secs }
            | SkillCommand::Wait { secs } => *secs,
            SkillCommand::Jump => 0.2,
            SkillCommand::LookAround => 1.5,
        };
        Duration::from_secs_f32(secs.max(0.0))
    }
}

struct ActiveStep {
    cmd: SkillCommand,
    started: Instant,
}

/// Executes a validated plan one primitive at a time, tick-natively: the
/// active step drives the reconciler on every tick the arbitrator awards
/// to the plan layer, until its duration elapses.
pub struct PlanRunner {
    queue: VecDeque<SkillCommand>,
    active: Option<ActiveStep>,
}

impl PlanRunner {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            active: None,
        }
    }

    /// Validate raw planner steps and queue the good ones. Each offending
    /// step is reported individually.
    pub fn push_plan(&mut self, steps: &[String]) {
        for step in steps {
            if step.trim().is_empty() {
                continue;
            }
            match SkillCommand::parse(step) {
                Ok(cmd) => {
                    info!("plan step queued: {}", cmd.label());
                    self.queue.push_back(cmd);
                }
                Err(e) => warn!("skipping plan step `{step}`: {e}"),
            }
        }
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.active = None;
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn has_active_step(&self) -> bool {
        self.active.is_some()
    }

    /// Label of the step that would run this tick, used as the plan-layer
    /// proposal.
    pub fn current_label(&self) -> Option<&'static str> {
        self.active
            .as_ref()
            .map(|a| a.cmd.label())
            .or_else(|| self.queue.front().map(|c| c.label()))
    }

    pub fn tick(&mut self, reconciler: &mut Reconciler, now: Instant) {
        if self.active.is_none() {
            let Some(cmd) = self.queue.pop_front() else {
                return;
            };
            self.active = Some(ActiveStep { cmd, started: now });
        }

        let step = self.active.as_ref().unwrap();
        let elapsed = now.duration_since(step.started);

        if elapsed >= step.cmd.duration() {
            self.finish_step(reconciler);
            return;
        }

        match step.cmd {
            SkillCommand::MoveForward { .. } => reconciler.set_move(0.0, 1.0),
            SkillCommand::MoveBackward { .. } => reconciler.set_move(0.0, -1.0),
            SkillCommand::Jump => reconciler.set_button(Button::Jump, true),
            SkillCommand::Attack { .. } => reconciler.set_trigger(Trigger::Right, 1.0),
            SkillCommand::LookAround => {
                // Scripted scan: sweep right, then back past center left.
                let x = if elapsed < Duration::from_millis(500) {
                    0.5
                } else {
                    -0.5
                };
                reconciler.set_look(x, 0.0);
            }
            SkillCommand::Wait { .. } => {}
        }
    }

    /// Release the active step's held inputs and put it back at the head
    /// of the queue. Called when a higher layer takes the tick away
    /// mid-step; the held input must not keep driving while another layer
    /// owns the device. The step restarts from scratch once the plan
    /// layer wins again.
    pub fn suspend(&mut self, reconciler: &mut Reconciler) {
        let Some(step) = self.active.take() else { return };
        release_held(step.cmd, reconciler);
        self.queue.push_front(step.cmd);
    }

    /// Release whatever the finished step was holding.
    fn finish_step(&mut self, reconciler: &mut Reconciler) {
        let Some(step) = self.active.take() else { return };
        release_held(step.cmd, reconciler);
    }
}

fn release_held(cmd: SkillCommand, reconciler: &mut Reconciler) {
    match cmd {
        SkillCommand::MoveForward { .. } | SkillCommand::MoveBackward { .. } => {
            reconciler.set_move(0.0, 0.0)
        }
        SkillCommand::Jump => reconciler.set_button(Button::Jump, false),
        SkillCommand::Attack { .. } => reconciler.set_trigger(Trigger::Right, 0.0),
        SkillCommand::LookAround => reconciler.set_look(0.0, 0.0),
        SkillCommand::Wait { .. } => {}
    }
}

impl Default for PlanRunner {
    fn default() -> Self {
        Self::new()
    }
}
