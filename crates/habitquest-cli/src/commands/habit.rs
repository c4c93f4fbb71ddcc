use chrono::Utc;
use clap::Subcommand;
use habitquest_core::progression::validate_amount;
use habitquest_core::LevelProgress;

use super::{check, open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Check a habit: positive grants XP, negative deals damage
    Track {
        /// Count as a bad habit
        #[arg(long)]
        negative: bool,
        /// Override the configured XP/damage amount
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<i64>,
    },
}

pub fn run(action: HabitAction) -> CliResult {
    let mut tracker = open_tracker()?;

    match action {
        HabitAction::Track { negative, amount } => {
            if let Some(amount) = amount {
                validate_amount("amount", amount)?;
            }
            let player = check(tracker.track_habit(!negative, amount, Utc::now()))?;
            print_json(&LevelProgress::of(&player))
        }
    }
}
