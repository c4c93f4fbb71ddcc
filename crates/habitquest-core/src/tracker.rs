//! Tracker: owns both engines and their collaborators.
//!
//! Every command runs the engine transition, forwards the emitted events to
//! the [`Notifier`], then commits the new snapshots to [`Storage`]. A failed
//! commit never rolls back the in-memory state; it is returned in the
//! [`Outcome`] and announced as [`Event::PersistenceFailed`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::events::Event;
use crate::notify::Notifier;
use crate::progression::{PlayerState, Priority, ProgressionEngine};
use crate::records::StudyRecords;
use crate::storage::{Config, Storage, STUDY_RECORDS_KEY, TIMER_KEY, USER_KEY};
use crate::timer::{SessionCompletion, TimerContext, TimerEngine, TimerMode, TimerState};

/// Result of a tracker command.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    /// Everything sent to the notifier during the command.
    pub events: Vec<Event>,
    /// Set when the snapshot could not be committed.
    pub persist_error: Option<StorageError>,
}

impl<T> Outcome<T> {
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

#[derive(Serialize)]
struct PersistedTimerRef<'a> {
    engine: &'a TimerEngine,
    last_tick_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct PersistedTimer {
    engine: TimerEngine,
    #[serde(default)]
    last_tick_at: Option<DateTime<Utc>>,
}

pub struct Tracker<S: Storage, N: Notifier> {
    config: Config,
    progression: ProgressionEngine,
    timer: TimerEngine,
    records: StudyRecords,
    last_tick_at: Option<DateTime<Utc>>,
    storage: S,
    notifier: N,
}

impl<S: Storage, N: Notifier> Tracker<S, N> {
    /// Load the committed snapshots from `storage`.
    ///
    /// Snapshots that fail to decode are replaced by defaults.
    ///
    /// # Errors
    /// Returns an error if the backend itself cannot be read.
    pub fn open(storage: S, notifier: N, config: Config) -> Result<Self, StorageError> {
        let player: PlayerState = load_or_default(&storage, USER_KEY)?.unwrap_or_default();
        let records: StudyRecords = load_or_default(&storage, STUDY_RECORDS_KEY)?.unwrap_or_default();
        let persisted: Option<PersistedTimer> = load_or_default(&storage, TIMER_KEY)?;
        let (timer, last_tick_at) = match persisted {
            Some(p) => (p.engine, p.last_tick_at),
            None => (TimerEngine::new(&config.timer), None),
        };

        Ok(Self {
            progression: ProgressionEngine::new(player),
            timer,
            records,
            last_tick_at,
            config,
            storage,
            notifier,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn player(&self) -> &PlayerState {
        self.progression.player()
    }

    pub fn progression(&self) -> &ProgressionEngine {
        &self.progression
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.snapshot()
    }

    pub fn records(&self) -> &StudyRecords {
        &self.records
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Replace the configuration. The timer picks it up at its next transition.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    // ── Progression ──────────────────────────────────────────────────

    pub fn add_xp(&mut self, amount: i64, now: DateTime<Utc>) -> Outcome<PlayerState> {
        let outcome = self.progression.add_xp(amount, now);
        self.finish(outcome.player, outcome.events, now)
    }

    pub fn subtract_xp(&mut self, amount: i64, now: DateTime<Utc>) -> Outcome<PlayerState> {
        let outcome = self.progression.subtract_xp(amount, now);
        self.finish(outcome.player, outcome.events, now)
    }

    pub fn take_damage(&mut self, amount: i64, now: DateTime<Utc>) -> Outcome<PlayerState> {
        let outcome = self.progression.take_damage(amount, now);
        self.finish(outcome.player, outcome.events, now)
    }

    pub fn heal(&mut self, amount: i64, now: DateTime<Utc>) -> Outcome<PlayerState> {
        let outcome = self.progression.heal(amount, now);
        self.finish(outcome.player, outcome.events, now)
    }

    /// Record activity for the UTC date of `now`.
    pub fn update_streak(&mut self, now: DateTime<Utc>) -> Outcome<PlayerState> {
        let outcome = self.progression.update_streak(now);
        self.finish(outcome.player, outcome.events, now)
    }

    /// Mark a task done: extend the streak, then award priority/streak XP.
    ///
    /// Returns the XP earned so it can be taken back by
    /// [`uncomplete_task`](Self::uncomplete_task).
    pub fn complete_task(
        &mut self,
        priority: Priority,
        base_xp: Option<u64>,
        now: DateTime<Utc>,
    ) -> Outcome<u64> {
        let base = base_xp.unwrap_or(u64::from(self.config.rewards.base_xp));
        let mut events = self.progression.update_streak(now).events;
        let earned = self.progression.task_xp(base, priority);
        events.extend(self.progression.add_xp(to_i64(earned), now).events);
        self.finish(earned, events, now)
    }

    /// Undo a completion by removing the XP it earned.
    pub fn uncomplete_task(&mut self, earned: i64, now: DateTime<Utc>) -> Outcome<PlayerState> {
        self.subtract_xp(earned, now)
    }

    /// A positive habit grants XP, a negative one deals damage.
    pub fn track_habit(
        &mut self,
        positive: bool,
        amount: Option<i64>,
        now: DateTime<Utc>,
    ) -> Outcome<PlayerState> {
        if positive {
            let amount = amount.unwrap_or(i64::from(self.config.rewards.habit_xp));
            self.add_xp(amount, now)
        } else {
            let amount = amount.unwrap_or(i64::from(self.config.rewards.damage));
            self.take_damage(amount, now)
        }
    }

    /// Damage for an overdue task of `priority`. Returns the HP lost.
    pub fn penalize_overdue(&mut self, priority: Priority, now: DateTime<Utc>) -> Outcome<u64> {
        let damage = self
            .progression
            .task_damage(u64::from(self.config.rewards.damage), priority);
        let events = self.progression.take_damage(to_i64(damage), now).events;
        self.finish(damage, events, now)
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn start_timer(&mut self, now: DateTime<Utc>) -> Outcome<TimerState> {
        let events: Vec<Event> = self.timer.start(now).into_iter().collect();
        // An already running timer keeps its marker so no seconds are skipped.
        if !events.is_empty() {
            self.last_tick_at = Some(now);
        }
        self.finish(self.timer.snapshot(), events, now)
    }

    pub fn pause_timer(&mut self, now: DateTime<Utc>) -> Outcome<TimerState> {
        let events: Vec<Event> = self
            .with_timer(now, |timer, cx| timer.pause(cx))
            .into_iter()
            .collect();
        self.last_tick_at = None;
        self.finish(self.timer.snapshot(), events, now)
    }

    /// Advance the timer by one second.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Outcome<Option<SessionCompletion>> {
        if !self.timer.is_running() {
            return Outcome {
                value: None,
                events: Vec::new(),
                persist_error: None,
            };
        }
        let completion = self.with_timer(now, |timer, cx| timer.tick(cx));
        self.last_tick_at = Some(now);
        let events = completion.as_ref().map(|c| c.events.clone()).unwrap_or_default();
        self.finish(completion, events, now)
    }

    /// Replay the seconds a running timer spent unobserved since its last
    /// tick. Stops early when a session ends without auto-start.
    pub fn catch_up(&mut self, now: DateTime<Utc>) -> Outcome<Vec<SessionCompletion>> {
        let mut completions = Vec::new();
        let last = match self.last_tick_at {
            Some(last) if self.timer.is_running() => last,
            _ => {
                return Outcome {
                    value: completions,
                    events: Vec::new(),
                    persist_error: None,
                }
            }
        };

        // Whole seconds only; the remainder stays behind the marker.
        let elapsed = (now - last).num_seconds().max(0);
        debug!(elapsed, "catching up timer");
        let mut events = Vec::new();
        for i in 1..=elapsed {
            if !self.timer.is_running() {
                break;
            }
            let at = last + Duration::seconds(i);
            if let Some(done) = self.with_timer(at, |timer, cx| timer.tick(cx)) {
                events.extend(done.events.iter().cloned());
                completions.push(done);
            }
        }
        self.last_tick_at = self
            .timer
            .is_running()
            .then(|| last + Duration::seconds(elapsed));
        self.finish(completions, events, now)
    }

    /// Finish the session if its time is up; `None` otherwise.
    pub fn complete_session(&mut self, now: DateTime<Utc>) -> Outcome<Option<SessionCompletion>> {
        let completion = self.with_timer(now, |timer, cx| timer.complete_session(cx));
        let events = completion.as_ref().map(|c| c.events.clone()).unwrap_or_default();
        self.sync_tick_marker(now);
        self.finish(completion, events, now)
    }

    pub fn skip(&mut self, now: DateTime<Utc>) -> Outcome<SessionCompletion> {
        let completion = self.with_timer(now, |timer, cx| timer.skip(cx));
        let events = completion.events.clone();
        self.sync_tick_marker(now);
        self.finish(completion, events, now)
    }

    pub fn reset_timer(&mut self, now: DateTime<Utc>) -> Outcome<TimerState> {
        let event = self.with_timer(now, |timer, cx| timer.reset(cx));
        self.last_tick_at = None;
        self.finish(self.timer.snapshot(), vec![event], now)
    }

    pub fn set_mode(&mut self, mode: TimerMode, now: DateTime<Utc>) -> Outcome<TimerState> {
        let events = self.with_timer(now, |timer, cx| timer.set_mode(mode, cx));
        self.last_tick_at = None;
        self.finish(self.timer.snapshot(), events, now)
    }

    pub fn set_task(&mut self, task: Option<String>, now: DateTime<Utc>) -> Outcome<TimerState> {
        self.timer.set_task(task);
        self.finish(self.timer.snapshot(), Vec::new(), now)
    }

    pub fn start_quick(&mut self, minutes: f64, now: DateTime<Utc>) -> Outcome<TimerState> {
        let events = self.with_timer(now, |timer, cx| timer.start_quick(minutes, cx));
        self.last_tick_at = Some(now);
        self.finish(self.timer.snapshot(), events, now)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn with_timer<R>(
        &mut self,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut TimerEngine, &mut TimerContext<'_>) -> R,
    ) -> R {
        let Self {
            config,
            progression,
            timer,
            records,
            ..
        } = self;
        let mut cx = TimerContext {
            config: &config.timer,
            sound_enabled: config.notifications.sound_enabled,
            progression,
            records,
            now,
        };
        f(timer, &mut cx)
    }

    fn sync_tick_marker(&mut self, now: DateTime<Utc>) {
        self.last_tick_at = self.timer.is_running().then_some(now);
    }

    fn finish<T>(&mut self, value: T, mut events: Vec<Event>, now: DateTime<Utc>) -> Outcome<T> {
        for event in &events {
            self.notifier.notify(event);
        }

        let persist_error = match self.commit() {
            Ok(()) => None,
            Err((key, err)) => {
                warn!(key, error = %err, "failed to persist snapshot");
                let event = Event::PersistenceFailed {
                    key: key.to_string(),
                    message: err.to_string(),
                    at: now,
                };
                self.notifier.notify(&event);
                events.push(event);
                Some(err)
            }
        };

        Outcome {
            value,
            events,
            persist_error,
        }
    }

    fn commit(&self) -> Result<(), (&'static str, StorageError)> {
        self.storage
            .save(USER_KEY, self.progression.player())
            .map_err(|e| (USER_KEY, e))?;
        self.storage
            .save(STUDY_RECORDS_KEY, &self.records)
            .map_err(|e| (STUDY_RECORDS_KEY, e))?;
        let timer = PersistedTimerRef {
            engine: &self.timer,
            last_tick_at: self.last_tick_at,
        };
        self.storage
            .save(TIMER_KEY, &timer)
            .map_err(|e| (TIMER_KEY, e))?;
        Ok(())
    }
}

fn load_or_default<S: Storage, T: serde::de::DeserializeOwned>(
    storage: &S,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.load(key) {
        Ok(value) => Ok(value),
        Err(err @ StorageError::Serialization { .. }) => {
            warn!(key, error = %err, "discarding unreadable snapshot");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn to_i64(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap()
    }

    fn short_config() -> Config {
        let mut config = Config::default();
        config.timer.work_minutes = 1;
        config.timer.break_minutes = 1;
        config.timer.long_break_minutes = 2;
        config.timer.checkpoint_secs = 0;
        config
    }

    fn tracker(config: Config) -> Tracker<MemoryStore, RecordingNotifier> {
        Tracker::open(MemoryStore::new(), RecordingNotifier::new(), config).unwrap()
    }

    #[test]
    fn commands_commit_all_snapshots() {
        let mut t = tracker(Config::default());
        let out = t.add_xp(30, at(9, 0, 0));
        assert!(out.is_persisted());
        assert!(t.storage().get(USER_KEY).is_some());
        assert!(t.storage().get(STUDY_RECORDS_KEY).is_some());
        assert!(t.storage().get(TIMER_KEY).is_some());
    }

    #[test]
    fn reopen_restores_state() {
        let store = MemoryStore::new();
        {
            let mut t = Tracker::open(&store, RecordingNotifier::new(), Config::default()).unwrap();
            t.add_xp(150, at(9, 0, 0));
            t.set_task(Some("chapter 3".into()), at(9, 0, 0));
        }
        let t = Tracker::open(&store, RecordingNotifier::new(), Config::default()).unwrap();
        assert_eq!(t.player().level, 2);
        assert_eq!(t.player().xp, 50);
        assert_eq!(t.timer().current_task(), Some("chapter 3"));
    }

    #[test]
    fn unreadable_snapshot_falls_back_to_default() {
        let store = MemoryStore::new();
        store.save_raw(USER_KEY, "{broken").unwrap();
        let t = Tracker::open(&store, RecordingNotifier::new(), Config::default()).unwrap();
        assert_eq!(t.player(), &PlayerState::default());
    }

    #[test]
    fn complete_task_applies_streak_bonus_and_can_be_undone() {
        let mut t = tracker(Config::default());
        let day1 = at(9, 0, 0);
        let first = t.complete_task(Priority::High, None, day1);
        // streak 1: 10 * 1.5 * 1.05 = 15.75
        assert_eq!(first.value, 16);
        assert_eq!(t.player().streak, 1);

        let undone = t.uncomplete_task(first.value as i64, day1);
        assert_eq!(undone.value.xp, 0);
        assert_eq!(t.player().total_xp, 0);
    }

    #[test]
    fn habits_use_configured_defaults() {
        let mut t = tracker(Config::default());
        t.track_habit(true, None, at(9, 0, 0));
        assert_eq!(t.player().xp, 5);
        t.track_habit(false, None, at(9, 0, 0));
        assert_eq!(t.player().hp, 95);
        t.track_habit(false, Some(20), at(9, 0, 0));
        assert_eq!(t.player().hp, 75);
    }

    #[test]
    fn overdue_penalty_scales_with_priority() {
        let mut t = tracker(Config::default());
        let out = t.penalize_overdue(Priority::High, at(9, 0, 0));
        assert_eq!(out.value, 10);
        assert_eq!(t.player().hp, 90);
    }

    #[test]
    fn events_reach_the_notifier() {
        let mut t = tracker(Config::default());
        t.add_xp(100, at(9, 0, 0));
        let events = t.notifier().take();
        assert!(events.iter().any(|e| matches!(e, Event::LevelUp { level: 2, .. })));
    }

    #[test]
    fn ticking_through_a_work_session_awards_xp() {
        let mut t = tracker(short_config());
        let start = at(10, 0, 0);
        t.start_timer(start);
        let mut completions = 0;
        for i in 1..=60 {
            if t.tick(start + Duration::seconds(i)).value.is_some() {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(t.player().total_xp, 15);
        assert_eq!(t.timer().mode(), TimerMode::Break);
        let day = t.records().day(start.date_naive()).unwrap();
        assert_eq!(day.pomodoros, 1);
        assert_eq!(day.study_time_secs, 60);
    }

    #[test]
    fn catch_up_replays_elapsed_seconds() {
        let mut t = tracker(short_config());
        let start = at(10, 0, 0);
        t.start_timer(start);
        let out = t.catch_up(start + Duration::seconds(90));
        assert_eq!(out.value.len(), 1);
        // stops at completion because auto-start is off
        assert!(!t.timer().is_running());
        assert_eq!(t.timer().time_left_secs(), 60);
    }

    #[test]
    fn catch_up_keeps_sub_second_remainders() {
        let mut t = tracker(short_config());
        let start = at(10, 0, 0);
        t.start_timer(start);
        for i in 1..=10 {
            t.catch_up(start + Duration::milliseconds(900 * i));
        }
        // 9 s of wall time
        assert_eq!(t.timer().time_left_secs(), 60 - 9);
    }

    #[test]
    fn restarting_a_running_timer_keeps_elapsed_time() {
        let mut t = tracker(short_config());
        let start = at(10, 0, 0);
        t.start_timer(start);
        let out = t.start_timer(start + Duration::seconds(20));
        assert!(out.events.is_empty());
        t.catch_up(start + Duration::seconds(20));
        assert_eq!(t.timer().time_left_secs(), 40);
    }

    #[test]
    fn replayed_events_carry_the_replayed_second() {
        let mut t = tracker(short_config());
        let start = at(10, 0, 0);
        t.start_timer(start);
        let out = t.catch_up(start + Duration::seconds(75));
        let completed = out
            .events
            .iter()
            .find(|e| matches!(e, Event::SessionCompleted { .. }))
            .unwrap();
        assert_eq!(completed.at(), start + Duration::seconds(60));
    }

    #[test]
    fn catch_up_is_a_noop_when_idle() {
        let mut t = tracker(short_config());
        let out = t.catch_up(at(12, 0, 0));
        assert!(out.value.is_empty());
        assert!(out.events.is_empty());
    }

    #[test]
    fn early_complete_session_is_suppressed() {
        let mut t = tracker(short_config());
        t.start_timer(at(10, 0, 0));
        let out = t.complete_session(at(10, 0, 5));
        assert!(out.value.is_none());
        assert!(t.timer().is_running());
    }

    #[test]
    fn skip_moves_to_break() {
        let mut t = tracker(short_config());
        let out = t.skip(at(10, 0, 0));
        assert_eq!(out.value.next, TimerMode::Break);
        assert_eq!(t.player().total_xp, 15);
    }
}
