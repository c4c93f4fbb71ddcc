//! Level curve.
//!
//! A single linear curve is used everywhere a level threshold is computed,
//! both for leveling and for display: `100, 110, 120, ...`.

use serde::{Deserialize, Serialize};

use super::player::PlayerState;

const BASE_LEVEL_XP: u64 = 100;
const LEVEL_XP_STEP: u64 = 10;

/// XP needed to go from `level` to `level + 1`.
///
/// Levels below 1 are treated as level 1.
pub fn xp_required_for(level: u32) -> u64 {
    let steps = u64::from(level.max(1) - 1);
    BASE_LEVEL_XP.saturating_add(LEVEL_XP_STEP.saturating_mul(steps))
}

/// Lifetime XP needed to reach `level` from a fresh level-1 player.
pub fn total_xp_for_level(level: u32) -> u64 {
    (1..level.max(1)).map(xp_required_for).sum()
}

/// Display view of a player's position on the curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u64,
    pub xp_required: u64,
    /// 0.0 .. 100.0
    pub xp_pct: f64,
    pub hp: u32,
    pub max_hp: u32,
    /// 0.0 .. 100.0
    pub hp_pct: f64,
    pub total_xp: u64,
    pub streak: u32,
}

impl LevelProgress {
    pub fn of(player: &PlayerState) -> Self {
        let xp_required = xp_required_for(player.level);
        let hp_pct = if player.max_hp == 0 {
            0.0
        } else {
            f64::from(player.hp) / f64::from(player.max_hp) * 100.0
        };
        Self {
            level: player.level,
            xp: player.xp,
            xp_required,
            xp_pct: (player.xp as f64 / xp_required as f64 * 100.0).min(100.0),
            hp: player.hp,
            max_hp: player.max_hp,
            hp_pct,
            total_xp: player.total_xp,
            streak: player.streak,
        }
    }
}
