use chrono::Utc;
use clap::Subcommand;
use habitquest_core::progression::validate_amount;
use habitquest_core::{LevelProgress, Priority};
use serde_json::json;

use super::{check, open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Complete a task and earn XP
    Complete {
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Override the configured base XP
        #[arg(long)]
        base_xp: Option<u64>,
    },
    /// Undo a completion, removing the XP it earned
    Uncomplete {
        /// XP printed by `task complete`
        #[arg(allow_hyphen_values = true)]
        earned: i64,
    },
    /// Apply the penalty for an overdue task
    Overdue {
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut tracker = open_tracker()?;
    let now = Utc::now();

    match action {
        TaskAction::Complete { priority, base_xp } => {
            let earned = check(tracker.complete_task(priority, base_xp, now))?;
            print_json(&json!({
                "xp_earned": earned,
                "player": LevelProgress::of(tracker.player()),
            }))
        }
        TaskAction::Uncomplete { earned } => {
            validate_amount("earned", earned)?;
            let player = check(tracker.uncomplete_task(earned, now))?;
            print_json(&LevelProgress::of(&player))
        }
        TaskAction::Overdue { priority } => {
            let damage = check(tracker.penalize_overdue(priority, now))?;
            print_json(&json!({
                "damage": damage,
                "player": LevelProgress::of(tracker.player()),
            }))
        }
    }
}
