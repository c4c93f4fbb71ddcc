//! Task reward and penalty formulas.

use serde::{Deserialize, Serialize};

/// Streak bonus: 5% per active day.
const STREAK_BONUS_PCT_PER_DAY: u64 = 5;
/// Streak bonus cap: +50%.
const MAX_STREAK_BONUS_PCT: u64 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn xp_multiplier(self) -> f64 {
        match self {
            Priority::Low => 0.8,
            Priority::Medium => 1.0,
            Priority::High => 1.5,
        }
    }

    pub fn damage_multiplier(self) -> f64 {
        match self {
            Priority::Low => 0.5,
            Priority::Medium => 1.0,
            Priority::High => 2.0,
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// XP for completing a task: priority multiplier, then streak bonus,
/// rounded half-up.
pub fn calculate_task_xp(base_xp: u64, priority: Priority, streak: u32) -> u64 {
    let bonus_pct = (u64::from(streak) * STREAK_BONUS_PCT_PER_DAY).min(MAX_STREAK_BONUS_PCT);
    let xp = base_xp as f64 * priority.xp_multiplier() * (100 + bonus_pct) as f64 / 100.0;
    round_half_up(xp)
}

/// HP penalty for an overdue task.
pub fn calculate_task_damage(base_damage: u64, priority: Priority) -> u64 {
    round_half_up(base_damage as f64 * priority.damage_multiplier())
}

fn round_half_up(value: f64) -> u64 {
    // Multipliers like 0.8 are inexact; trim the noise before rounding.
    let cleaned = (value * 1e9).round() / 1e9;
    (cleaned + 0.5).floor().max(0.0) as u64
}
