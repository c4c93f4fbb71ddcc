//! Pomodoro timer engine.
//!
//! The timer engine is a tick-driven state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` once per second.
//!
//! ## State Transitions
//!
//! ```text
//! work --complete--> break | long-break --complete--> work
//! Idle -> Running -> Paused -> Running ...
//! ```
//!
//! Elapsed seconds accumulate in an unsaved buffer and are flushed into the
//! day's [`DailyStudyRecord`](crate::records::DailyStudyRecord) on pause,
//! on session completion, on reset and every `checkpoint_secs`.
//!
//! A session can only complete when `time_left` is 0 or through `skip()`.
//! Completion resets `time_left` to the next mode's positive duration before
//! returning, so a second `complete_session()` is a no-op.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = TimerEngine::new(&config.timer);
//! timer.start(now);
//! // Once per second:
//! if let Some(done) = timer.tick(&mut cx) { /* session finished */ }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::chime::Chime;
use super::mode::TimerMode;
use crate::events::Event;
use crate::progression::ProgressionEngine;
use crate::records::{SessionLogEntry, StudyRecords};
use crate::storage::TimerConfig;

/// XP awarded for every completed work session.
pub const POMODORO_XP: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// Seconds counted by `tick()` but not yet written to the study records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsavedTime {
    pub study_secs: u64,
    pub break_secs: u64,
}

impl UnsavedTime {
    fn add(&mut self, mode: TimerMode, secs: u64) {
        if mode.is_break() {
            self.break_secs += secs;
        } else {
            self.study_secs += secs;
        }
    }

    pub fn total(&self) -> u64 {
        self.study_secs + self.break_secs
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Everything a transition may touch outside the timer itself.
///
/// Configuration is read on every call, so a settings change takes effect
/// at the next mode transition.
pub struct TimerContext<'a> {
    pub config: &'a TimerConfig,
    pub sound_enabled: bool,
    pub progression: &'a mut ProgressionEngine,
    pub records: &'a mut StudyRecords,
    pub now: DateTime<Utc>,
}

/// Result of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCompletion {
    pub completed: TimerMode,
    pub next: TimerMode,
    pub xp_awarded: u64,
    pub auto_started: bool,
    pub events: Vec<Event>,
}

/// Display snapshot of the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub status: TimerStatus,
    pub running: bool,
    pub time_left_secs: u64,
    pub total_secs: u64,
    pub session: u32,
    pub current_task: Option<String>,
    pub clock: String,
    /// 0.0 .. 1.0 progress within the current session.
    pub progress: f64,
}

/// Core timer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    mode: TimerMode,
    status: TimerStatus,
    time_left_secs: u64,
    total_secs: u64,
    /// Work sessions completed since the last long break, starting at 1.
    session: u32,
    #[serde(default)]
    current_task: Option<String>,
    #[serde(default)]
    unsaved: UnsavedTime,
}

impl TimerEngine {
    /// Create an idle timer at the start of a work session.
    pub fn new(config: &TimerConfig) -> Self {
        let total_secs = TimerMode::Work.duration_secs(config);
        Self {
            mode: TimerMode::Work,
            status: TimerStatus::Idle,
            time_left_secs: total_secs,
            total_secs,
            session: 1,
            current_task: None,
            unsaved: UnsavedTime::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn time_left_secs(&self) -> u64 {
        self.time_left_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn session(&self) -> u32 {
        self.session
    }

    pub fn current_task(&self) -> Option<&str> {
        self.current_task.as_deref()
    }

    pub fn unsaved(&self) -> UnsavedTime {
        self.unsaved
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        1.0 - (self.time_left_secs as f64 / self.total_secs as f64)
    }

    pub fn snapshot(&self) -> TimerState {
        TimerState {
            mode: self.mode,
            status: self.status,
            running: self.is_running(),
            time_left_secs: self.time_left_secs,
            total_secs: self.total_secs,
            session: self.session,
            current_task: self.current_task.clone(),
            clock: format_clock(self.time_left_secs),
            progress: self.progress(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        let resumed = self.status == TimerStatus::Paused;
        self.status = TimerStatus::Running;
        Some(Event::TimerStarted {
            mode: self.mode,
            session: self.session,
            remaining_secs: self.time_left_secs,
            resumed,
            at: now,
        })
    }

    pub fn pause(&mut self, cx: &mut TimerContext<'_>) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        self.flush(cx);
        self.status = TimerStatus::Paused;
        Some(Event::TimerPaused {
            mode: self.mode,
            remaining_secs: self.time_left_secs,
            at: cx.now,
        })
    }

    /// Advance one second. Returns the completion when the session ends.
    pub fn tick(&mut self, cx: &mut TimerContext<'_>) -> Option<SessionCompletion> {
        if !self.is_running() {
            return None;
        }
        self.time_left_secs = self.time_left_secs.saturating_sub(1);
        self.unsaved.add(self.mode, 1);

        let checkpoint = u64::from(cx.config.checkpoint_secs);
        if checkpoint > 0 && self.unsaved.total() >= checkpoint {
            self.flush(cx);
        }

        if self.time_left_secs == 0 {
            return self.complete_session(cx);
        }
        None
    }

    /// Finish the current session if its time is up.
    ///
    /// Returns `None` while time remains, which makes repeated calls after
    /// a completion harmless.
    pub fn complete_session(&mut self, cx: &mut TimerContext<'_>) -> Option<SessionCompletion> {
        if self.time_left_secs > 0 {
            debug!(
                mode = %self.mode,
                time_left = self.time_left_secs,
                "completion suppressed, session still has time left"
            );
            return None;
        }
        Some(self.finish_session(cx))
    }

    /// End the current session now, regardless of remaining time.
    pub fn skip(&mut self, cx: &mut TimerContext<'_>) -> SessionCompletion {
        self.finish_session(cx)
    }

    /// Stop and return to the first work session. Buffered seconds are kept.
    pub fn reset(&mut self, cx: &mut TimerContext<'_>) -> Event {
        self.flush(cx);
        self.status = TimerStatus::Idle;
        self.session = 1;
        self.switch_to(TimerMode::Work, cx.config);
        Event::TimerReset { at: cx.now }
    }

    /// Manually switch modes. A running timer is paused first.
    pub fn set_mode(&mut self, mode: TimerMode, cx: &mut TimerContext<'_>) -> Vec<Event> {
        let mut events = Vec::new();
        events.extend(self.pause(cx));
        self.flush(cx);
        self.status = TimerStatus::Idle;
        self.switch_to(mode, cx.config);
        events.push(Event::ModeChanged {
            mode,
            duration_secs: self.total_secs,
            at: cx.now,
        });
        events
    }

    pub fn set_task(&mut self, task: Option<String>) {
        self.current_task = task;
    }

    /// Start a one-off work session of `minutes` (at least one second).
    pub fn start_quick(&mut self, minutes: f64, cx: &mut TimerContext<'_>) -> Vec<Event> {
        let mut events = Vec::new();
        events.extend(self.pause(cx));
        self.flush(cx);
        let secs = ((minutes * 60.0).floor() as u64).max(1);
        self.mode = TimerMode::Work;
        self.total_secs = secs;
        self.time_left_secs = secs;
        self.status = TimerStatus::Idle;
        events.extend(self.start(cx.now));
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish_session(&mut self, cx: &mut TimerContext<'_>) -> SessionCompletion {
        let completed = self.mode;
        self.flush(cx);

        let day = cx.records.day_mut(cx.now.date_naive());
        day.log_session(SessionLogEntry {
            kind: completed,
            task: self.current_task.clone(),
            completed_at: cx.now,
        });

        let mut progression_events = Vec::new();
        let (next, xp_awarded, auto_start) = match completed {
            TimerMode::Work => {
                day.pomodoros = day.pomodoros.saturating_add(1);
                let outcome = cx.progression.add_xp(POMODORO_XP as i64, cx.now);
                progression_events = outcome.events;

                let next = if self.session >= cx.config.sessions_before_long_break.max(1) {
                    self.session = 1;
                    TimerMode::LongBreak
                } else {
                    self.session += 1;
                    TimerMode::Break
                };
                (next, POMODORO_XP, cx.config.auto_start_break)
            }
            TimerMode::Break | TimerMode::LongBreak => {
                (TimerMode::Work, 0, cx.config.auto_start_work)
            }
        };

        self.switch_to(next, cx.config);
        self.status = TimerStatus::Idle;
        info!(completed = %completed, next = %next, session = self.session, "session completed");

        let mut events = vec![Event::SessionCompleted {
            mode: completed,
            next_mode: next,
            session: self.session,
            xp_awarded,
            auto_started: auto_start,
            chime: cx.sound_enabled.then(|| Chime::for_completed(completed)),
            at: cx.now,
        }];
        events.extend(progression_events);
        if auto_start {
            events.extend(self.start(cx.now));
        }

        SessionCompletion {
            completed,
            next,
            xp_awarded,
            auto_started: auto_start,
            events,
        }
    }

    fn switch_to(&mut self, mode: TimerMode, config: &TimerConfig) {
        self.mode = mode;
        self.total_secs = mode.duration_secs(config);
        self.time_left_secs = self.total_secs;
    }

    /// Drain the unsaved buffer into today's record.
    fn flush(&mut self, cx: &mut TimerContext<'_>) {
        if self.unsaved.is_empty() {
            return;
        }
        let day = cx.records.day_mut(cx.now.date_naive());
        day.add_study_secs(self.unsaved.study_secs);
        day.add_break_secs(self.unsaved.break_secs);
        debug!(
            study_secs = self.unsaved.study_secs,
            break_secs = self.unsaved.break_secs,
            "flushed unsaved time"
        );
        self.unsaved = UnsavedTime::default();
    }
}

/// `mm:ss`, or `h:mm:ss` from one hour up.
pub fn format_clock(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
