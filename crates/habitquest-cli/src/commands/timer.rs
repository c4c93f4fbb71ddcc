use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use habitquest_core::timer::format_clock;
use habitquest_core::{TimerMode, ValidationError};
use tracing::debug;

use super::{check, open_tracker, print_json, CliResult, CliTracker};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the timer
    Start,
    /// Pause the timer
    Pause,
    /// End the current session now
    Skip,
    /// Stop and return to the first work session
    Reset,
    /// Switch mode (work, break, long-break)
    Mode { mode: TimerMode },
    /// Attach a task to the session, or clear it
    Task {
        name: Option<String>,
        #[arg(long, conflicts_with = "name")]
        clear: bool,
    },
    /// Start a one-off work session of custom length
    Quick {
        /// Minutes, fractions allowed
        minutes: f64,
    },
    /// Print current timer state as JSON
    Status,
    /// Run the timer in the foreground until it stops or Ctrl-C
    Run,
}

pub fn run(action: TimerAction) -> CliResult {
    let mut tracker = open_tracker()?;
    let now = Utc::now();

    match action {
        TimerAction::Start => {
            check(tracker.start_timer(now))?;
        }
        TimerAction::Pause => {
            check(tracker.pause_timer(now))?;
        }
        TimerAction::Skip => {
            let done = check(tracker.skip(now))?;
            print_json(&done)?;
            return Ok(());
        }
        TimerAction::Reset => {
            check(tracker.reset_timer(now))?;
        }
        TimerAction::Mode { mode } => {
            check(tracker.set_mode(mode, now))?;
        }
        TimerAction::Task { name, clear } => {
            let task = if clear { None } else { name };
            check(tracker.set_task(task, now))?;
        }
        TimerAction::Quick { minutes } => {
            if !minutes.is_finite() || minutes < 0.0 {
                return Err(ValidationError::InvalidDuration(minutes.to_string()).into());
            }
            check(tracker.start_quick(minutes, now))?;
        }
        TimerAction::Status => {}
        TimerAction::Run => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_live(&mut tracker))?;
        }
    }

    print_json(&tracker.timer_state())
}

/// Drive `tick()` once per second. Ctrl-C pauses the timer, flushing the
/// buffered seconds, before exiting.
async fn run_live(tracker: &mut CliTracker) -> CliResult {
    if !tracker.timer().is_running() {
        check(tracker.start_timer(Utc::now()))?;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("ctrl-c received, pausing timer");
                check(tracker.pause_timer(Utc::now()))?;
                break;
            }
            _ = interval.tick() => {
                check(tracker.tick(Utc::now()))?;
                let timer = tracker.timer();
                eprint!("\r{} {}  ", timer.mode().label(), format_clock(timer.time_left_secs()));
                std::io::stderr().flush()?;
                if !timer.is_running() {
                    break;
                }
            }
        }
    }
    eprintln!();
    Ok(())
}
