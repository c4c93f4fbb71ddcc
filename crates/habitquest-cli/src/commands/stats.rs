use chrono::{NaiveDate, Utc};
use clap::Subcommand;

use super::{open_tracker, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
    /// Stats over an inclusive date range (YYYY-MM-DD)
    Range { from: NaiveDate, to: NaiveDate },
}

pub fn run(action: StatsAction) -> CliResult {
    let tracker = open_tracker()?;

    let stats = match action {
        StatsAction::Today => tracker.records().stats_for(Utc::now().date_naive()),
        StatsAction::All => tracker.records().stats_all(),
        StatsAction::Range { from, to } => tracker.records().stats_between(from, to),
    };
    print_json(&stats)
}
