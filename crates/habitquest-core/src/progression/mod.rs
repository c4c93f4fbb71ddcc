mod curve;
mod engine;
mod player;
mod rewards;

pub use curve::{total_xp_for_level, xp_required_for, LevelProgress};
pub use engine::{clamp_amount, validate_amount, ProgressOutcome, ProgressionEngine};
pub use player::PlayerState;
pub use rewards::{calculate_task_damage, calculate_task_xp, Priority};
