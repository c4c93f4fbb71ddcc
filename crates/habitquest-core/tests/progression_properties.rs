//! Property tests for the progression invariants.

use chrono::{DateTime, TimeZone, Utc};
use habitquest_core::progression::{xp_required_for, PlayerState, ProgressionEngine};
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
}

fn arb_player() -> impl Strategy<Value = PlayerState> {
    (1u32..60, 0u64..5_000, 1u32..=100).prop_map(|(level, xp, hp_pct)| {
        let max_hp = 100 + 10 * (level - 1);
        let xp = xp % xp_required_for(level);
        PlayerState {
            level,
            xp,
            total_xp: xp,
            hp: max_hp * hp_pct / 100,
            max_hp,
            ..PlayerState::default()
        }
    })
}

proptest! {
    #[test]
    fn prop_xp_stays_below_requirement(player in arb_player(), amount in 0i64..50_000) {
        let mut engine = ProgressionEngine::new(player);
        let p = engine.add_xp(amount, now()).player;
        prop_assert!(p.level >= 1);
        prop_assert!(p.xp < xp_required_for(p.level));
    }

    #[test]
    fn prop_hp_within_bounds(player in arb_player(), ops in prop::collection::vec((0u8..3, 0i64..500), 1..30)) {
        let mut engine = ProgressionEngine::new(player);
        for (kind, amount) in ops {
            let p = match kind {
                0 => engine.take_damage(amount, now()).player,
                1 => engine.heal(amount, now()).player,
                _ => engine.add_xp(amount, now()).player,
            };
            prop_assert!(p.hp <= p.max_hp);
            prop_assert!(p.level >= 1);
            prop_assert!(p.max_hp >= 100);
        }
    }

    #[test]
    fn prop_add_then_subtract_restores_within_level(player in arb_player(), amount in 0i64..500) {
        let mut engine = ProgressionEngine::new(player.clone());
        let level_before = engine.player().level;
        engine.add_xp(amount, now());
        let crossed = engine.player().level != level_before;
        let p = engine.subtract_xp(amount, now()).player;
        if !crossed {
            prop_assert_eq!(p.xp, player.xp);
            prop_assert_eq!(p.total_xp, player.total_xp);
        } else {
            prop_assert!(p.level > level_before);
        }
    }

    #[test]
    fn prop_negative_amounts_change_nothing(player in arb_player(), amount in i64::MIN..0) {
        let mut engine = ProgressionEngine::new(player);
        let before = engine.player().clone();
        engine.add_xp(amount, now());
        engine.take_damage(amount, now());
        engine.heal(amount, now());
        engine.subtract_xp(amount, now());
        prop_assert_eq!(engine.player(), &before);
    }
}
