//! Progression engine.
//!
//! Owns the [`PlayerState`] and applies XP gain/loss, damage, healing and
//! streak updates. Every command returns the new snapshot together with the
//! events it produced; the engine performs no I/O.
//!
//! ## Rules
//!
//! - Level-up: `max_hp += 10` and HP is fully restored.
//! - Level-down (HP reaches 0 above level 1): `level -= 1`, HP restored to
//!   `max_hp`. `max_hp` is kept.
//! - `subtract_xp` never reverses a level.
//! - Negative amounts are clamped to 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::curve::xp_required_for;
use super::player::PlayerState;
use super::rewards::{calculate_task_damage, calculate_task_xp, Priority};
use crate::error::ValidationError;
use crate::events::Event;

const MAX_HP_PER_LEVEL: u32 = 10;

/// Result of a progression command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressOutcome {
    pub player: PlayerState,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressionEngine {
    player: PlayerState,
}

impl ProgressionEngine {
    /// Wrap an existing record, repairing it if it violates the invariants.
    pub fn new(player: PlayerState) -> Self {
        Self {
            player: player.normalized(),
        }
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn add_xp(&mut self, amount: i64, now: DateTime<Utc>) -> ProgressOutcome {
        let amount = clamp_amount("xp", amount);
        let mut events = Vec::new();
        if amount == 0 {
            return self.outcome(events);
        }

        let p = &mut self.player;
        p.xp = p.xp.saturating_add(amount);
        p.total_xp = p.total_xp.saturating_add(amount);
        events.push(Event::XpGained {
            amount,
            total_xp: p.total_xp,
            at: now,
        });

        while p.xp >= xp_required_for(p.level) {
            p.xp -= xp_required_for(p.level);
            p.level = p.level.saturating_add(1);
            p.max_hp = p.max_hp.saturating_add(MAX_HP_PER_LEVEL);
            p.hp = p.max_hp;
            info!(level = p.level, max_hp = p.max_hp, "level up");
            events.push(Event::LevelUp {
                level: p.level,
                max_hp: p.max_hp,
                at: now,
            });
        }

        self.outcome(events)
    }

    /// Reverse an earlier award. Levels already gained are kept.
    pub fn subtract_xp(&mut self, amount: i64, now: DateTime<Utc>) -> ProgressOutcome {
        let amount = clamp_amount("xp", amount);
        let mut events = Vec::new();
        if amount > 0 {
            let p = &mut self.player;
            p.xp = p.xp.saturating_sub(amount);
            p.total_xp = p.total_xp.saturating_sub(amount);
            events.push(Event::XpDeducted {
                amount,
                total_xp: p.total_xp,
                at: now,
            });
        }
        self.outcome(events)
    }

    pub fn take_damage(&mut self, amount: i64, now: DateTime<Utc>) -> ProgressOutcome {
        let amount = clamp_amount("damage", amount);
        let p = &mut self.player;
        let hit = u32::try_from(amount).unwrap_or(u32::MAX);
        p.hp = p.hp.saturating_sub(hit);

        let event = if p.hp == 0 && p.level > 1 {
            p.level -= 1;
            p.hp = p.max_hp;
            info!(level = p.level, "level down");
            Event::LevelDown {
                level: p.level,
                hp: p.hp,
                at: now,
            }
        } else {
            Event::Damage {
                amount,
                hp: p.hp,
                at: now,
            }
        };
        self.outcome(vec![event])
    }

    pub fn heal(&mut self, amount: i64, now: DateTime<Utc>) -> ProgressOutcome {
        let amount = clamp_amount("heal", amount);
        let p = &mut self.player;
        let gain = u32::try_from(amount).unwrap_or(u32::MAX);
        p.hp = p.hp.saturating_add(gain).min(p.max_hp);
        let event = Event::Healed {
            amount,
            hp: p.hp,
            at: now,
        };
        self.outcome(vec![event])
    }

    /// Record activity on the UTC date of `now`. Consecutive days extend the
    /// streak, a gap resets it to 1, and repeated calls on the same day do
    /// nothing.
    pub fn update_streak(&mut self, now: DateTime<Utc>) -> ProgressOutcome {
        let today = now.date_naive();
        let p = &mut self.player;
        let previous = p.streak;
        match p.last_active_date {
            Some(last) if last == today => {}
            Some(last) if today.pred_opt() == Some(last) => p.streak = p.streak.saturating_add(1),
            _ => p.streak = 1,
        }
        p.last_active_date = Some(today);

        let mut events = Vec::new();
        if p.streak != previous {
            events.push(Event::StreakUpdated {
                streak: p.streak,
                at: now,
            });
        }
        self.outcome(events)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// XP a task of `priority` is worth at the current streak.
    pub fn task_xp(&self, base_xp: u64, priority: Priority) -> u64 {
        calculate_task_xp(base_xp, priority, self.player.streak)
    }

    pub fn task_damage(&self, base_damage: u64, priority: Priority) -> u64 {
        calculate_task_damage(base_damage, priority)
    }

    fn outcome(&self, events: Vec<Event>) -> ProgressOutcome {
        ProgressOutcome {
            player: self.player.clone(),
            events,
        }
    }
}

/// Lenient amount handling used by the engine: negatives become 0.
pub fn clamp_amount(field: &str, amount: i64) -> u64 {
    if amount < 0 {
        warn!(field, amount, "negative amount clamped to 0");
        0
    } else {
        amount as u64
    }
}

/// Strict amount handling for user input: negatives are rejected.
pub fn validate_amount(field: &str, amount: i64) -> Result<u64, ValidationError> {
    u64::try_from(amount).map_err(|_| ValidationError::InvalidAmount {
        field: field.to_string(),
        value: amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn engine_at(level: u32, hp: u32) -> ProgressionEngine {
        ProgressionEngine::new(PlayerState {
            level,
            hp,
            ..PlayerState::default()
        })
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn day(s: &str) -> DateTime<Utc> {
        date(s).and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    fn t0() -> DateTime<Utc> {
        day("2026-03-01")
    }

    #[test]
    fn add_xp_below_threshold() {
        let mut engine = ProgressionEngine::default();
        let out = engine.add_xp(50, t0());
        assert_eq!(out.player.xp, 50);
        assert_eq!(out.player.total_xp, 50);
        assert_eq!(out.player.level, 1);
        assert_eq!(out.events.len(), 1);
    }

    #[test]
    fn add_xp_levels_up_and_restores_hp() {
        let mut engine = engine_at(1, 40);
        let out = engine.add_xp(110, t0());
        assert_eq!(out.player.level, 2);
        assert_eq!(out.player.xp, 10);
        assert_eq!(out.player.max_hp, 110);
        assert_eq!(out.player.hp, out.player.max_hp);
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, Event::LevelUp { level: 2, .. })));
    }

    #[test]
    fn add_xp_can_cross_several_levels() {
        let mut engine = ProgressionEngine::default();
        // 100 + 110 + 120 = 330 reaches level 4
        let out = engine.add_xp(335, t0());
        assert_eq!(out.player.level, 4);
        assert_eq!(out.player.xp, 5);
        assert_eq!(out.player.max_hp, 130);
        let level_ups = out
            .events
            .iter()
            .filter(|e| matches!(e, Event::LevelUp { .. }))
            .count();
        assert_eq!(level_ups, 3);
    }

    #[test]
    fn add_zero_xp_is_a_no_op() {
        let mut engine = engine_at(3, 70);
        let before = engine.player().clone();
        let out = engine.add_xp(0, t0());
        assert_eq!(out.player, before);
        assert!(out.events.is_empty());
    }

    #[test]
    fn negative_amounts_are_clamped() {
        let mut engine = engine_at(2, 50);
        let before = engine.player().clone();
        assert_eq!(engine.add_xp(-20, t0()).player, before);
        assert_eq!(engine.subtract_xp(-20, t0()).player, before);
        assert_eq!(engine.take_damage(-20, t0()).player.hp, 50);
        assert_eq!(engine.heal(-20, t0()).player.hp, 50);
    }

    #[test]
    fn subtract_xp_floors_at_zero() {
        let mut engine = ProgressionEngine::default();
        engine.add_xp(30, t0());
        let out = engine.subtract_xp(50, t0());
        assert_eq!(out.player.xp, 0);
        assert_eq!(out.player.total_xp, 0);
    }

    #[test]
    fn subtract_xp_does_not_reverse_levels() {
        let mut engine = ProgressionEngine::default();
        engine.add_xp(110, t0());
        let out = engine.subtract_xp(110, t0());
        assert_eq!(out.player.level, 2);
        assert_eq!(out.player.xp, 0);
        assert_eq!(out.player.total_xp, 0);
    }

    #[test]
    fn damage_reduces_hp() {
        let mut engine = ProgressionEngine::default();
        let out = engine.take_damage(20, t0());
        assert_eq!(out.player.hp, 80);
        assert!(matches!(out.events[0], Event::Damage { amount: 20, hp: 80, .. }));
    }

    #[test]
    fn lethal_damage_at_level_one_stays_at_zero() {
        let mut engine = engine_at(1, 10);
        let out = engine.take_damage(20, t0());
        assert_eq!(out.player.hp, 0);
        assert_eq!(out.player.level, 1);
        assert!(matches!(out.events[0], Event::Damage { .. }));
    }

    #[test]
    fn lethal_damage_levels_down_and_restores_hp() {
        let mut engine = ProgressionEngine::new(PlayerState {
            level: 2,
            hp: 10,
            max_hp: 110,
            ..PlayerState::default()
        });
        let out = engine.take_damage(20, t0());
        assert_eq!(out.player.level, 1);
        assert_eq!(out.player.hp, 110);
        // max_hp is kept on level-down
        assert_eq!(out.player.max_hp, 110);
        assert!(matches!(out.events[0], Event::LevelDown { level: 1, .. }));
    }

    #[test]
    fn heal_caps_at_max_hp() {
        let mut engine = engine_at(1, 90);
        assert_eq!(engine.heal(5, t0()).player.hp, 95);
        assert_eq!(engine.heal(50, t0()).player.hp, 100);
    }

    #[test]
    fn streak_extends_on_consecutive_days() {
        let mut engine = ProgressionEngine::default();
        assert_eq!(engine.update_streak(day("2026-03-01")).player.streak, 1);
        assert_eq!(engine.update_streak(day("2026-03-02")).player.streak, 2);
        assert_eq!(engine.update_streak(day("2026-03-03")).player.streak, 3);
    }

    #[test]
    fn streak_same_day_is_idempotent() {
        let mut engine = ProgressionEngine::default();
        engine.update_streak(day("2026-03-01"));
        engine.update_streak(day("2026-03-02"));
        let out = engine.update_streak(day("2026-03-02"));
        assert_eq!(out.player.streak, 2);
        assert!(out.events.is_empty());
    }

    #[test]
    fn streak_resets_after_gap() {
        let mut engine = ProgressionEngine::default();
        engine.update_streak(day("2026-03-01"));
        engine.update_streak(day("2026-03-02"));
        let out = engine.update_streak(day("2026-03-05"));
        assert_eq!(out.player.streak, 1);
        assert_eq!(out.player.last_active_date, Some(date("2026-03-05")));
    }

    #[test]
    fn events_carry_the_injected_time() {
        let mut engine = ProgressionEngine::default();
        let at = day("2026-04-10");
        let out = engine.add_xp(120, at);
        assert!(out.events.iter().all(|e| e.at() == at));
        assert_eq!(engine.take_damage(5, at).events[0].at(), at);
        assert_eq!(engine.update_streak(at).events[0].at(), at);
    }

    #[test]
    fn task_xp_uses_current_streak() {
        let engine = ProgressionEngine::new(PlayerState {
            streak: 4,
            ..PlayerState::default()
        });
        // 10 * 1.5 * 1.2 = 18
        assert_eq!(engine.task_xp(10, Priority::High), 18);
    }

    #[test]
    fn validate_amount_rejects_negatives() {
        assert_eq!(validate_amount("xp", 7), Ok(7));
        assert_eq!(
            validate_amount("xp", -1),
            Err(ValidationError::InvalidAmount {
                field: "xp".into(),
                value: -1
            })
        );
    }
}
