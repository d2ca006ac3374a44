pub mod combat;
pub mod fishing;
pub mod plan;
pub mod retreat;

pub use combat::CombatSkill;
pub use fishing::{FishState, FishingSkill};
pub use plan::{PlanRunner, PlanStepError, SkillCommand};
pub use retreat::RetreatBehavior;
