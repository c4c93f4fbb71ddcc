pub mod config;
pub mod habit;
pub mod player;
pub mod stats;
pub mod task;
pub mod timer;

use chrono::Utc;
use habitquest_core::error::{CoreError, Result};
use habitquest_core::{Config, Database, Event, Notifier, Outcome, Tracker};
use serde::Serialize;

pub type CliResult = Result<()>;

/// Prints user-visible events to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, event: &Event) {
        tracing::debug!(?event, "event");
        if !event.is_user_visible() {
            return;
        }
        if let Some(message) = event.message() {
            eprintln!("{message}");
        }
    }
}

pub type CliTracker = Tracker<Database, ConsoleNotifier>;

/// Open the tracker over the on-disk database and advance a running timer
/// to the current time.
pub fn open_tracker() -> Result<CliTracker> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut tracker = Tracker::open(db, ConsoleNotifier, config)?;
    check(tracker.catch_up(Utc::now()))?;
    Ok(tracker)
}

/// Fail the command when its snapshot could not be committed.
pub fn check<T>(outcome: Outcome<T>) -> Result<T> {
    match outcome.persist_error {
        Some(err) => Err(CoreError::Storage(err)),
        None => Ok(outcome.value),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
