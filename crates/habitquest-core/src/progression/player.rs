use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::curve::xp_required_for;

pub(crate) const BASE_MAX_HP: u32 = 100;

/// The player record: one per user.
///
/// Mutated only through [`ProgressionEngine`](super::ProgressionEngine);
/// storage holds committed copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    pub level: u32,
    /// XP toward the next level. Always below `xp_required_for(level)`.
    pub xp: u64,
    /// Lifetime XP.
    pub total_xp: u64,
    pub hp: u32,
    pub max_hp: u32,
    /// Consecutive active days.
    pub streak: u32,
    pub last_active_date: Option<NaiveDate>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            total_xp: 0,
            hp: BASE_MAX_HP,
            max_hp: BASE_MAX_HP,
            streak: 0,
            last_active_date: None,
        }
    }
}

impl PlayerState {
    /// Bring a record loaded from storage back within the invariants.
    ///
    /// Excess XP is rolled into levels silently (no events), `hp` is capped
    /// at `max_hp` and `max_hp` is raised to the base value.
    pub fn normalized(mut self) -> Self {
        self.level = self.level.max(1);
        self.max_hp = self.max_hp.max(BASE_MAX_HP);
        self.hp = self.hp.min(self.max_hp);
        while self.xp >= xp_required_for(self.level) {
            self.xp -= xp_required_for(self.level);
            self.level = self.level.saturating_add(1);
        }
        self
    }

    pub fn is_consistent(&self) -> bool {
        self.level >= 1
            && self.xp < xp_required_for(self.level)
            && self.hp <= self.max_hp
            && self.max_hp >= BASE_MAX_HP
    }
}
