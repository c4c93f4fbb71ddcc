use chrono::Utc;
use clap::Subcommand;
use habitquest_core::progression::validate_amount;
use habitquest_core::LevelProgress;

use super::{check, open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum PlayerAction {
    /// Print level, XP and HP as JSON
    Status,
    /// Gain XP
    AddXp {
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },
    /// Remove XP (levels are kept)
    SubtractXp {
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },
    /// Lose HP
    Damage {
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },
    /// Restore HP
    Heal {
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },
    /// Record activity for today
    Streak,
}

pub fn run(action: PlayerAction) -> CliResult {
    let mut tracker = open_tracker()?;
    let now = Utc::now();

    let player = match action {
        PlayerAction::Status => tracker.player().clone(),
        PlayerAction::AddXp { amount } => {
            validate_amount("xp", amount)?;
            check(tracker.add_xp(amount, now))?
        }
        PlayerAction::SubtractXp { amount } => {
            validate_amount("xp", amount)?;
            check(tracker.subtract_xp(amount, now))?
        }
        PlayerAction::Damage { amount } => {
            validate_amount("damage", amount)?;
            check(tracker.take_damage(amount, now))?
        }
        PlayerAction::Heal { amount } => {
            validate_amount("heal", amount)?;
            check(tracker.heal(amount, now))?
        }
        PlayerAction::Streak => check(tracker.update_streak(now))?,
    };

    print_json(&LevelProgress::of(&player))
}
