//! Per-day study records.
//!
//! One [`DailyStudyRecord`] per calendar date, keyed by the UTC date of the
//! moment the time was flushed. The session log is append-only.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub kind: TimerMode,
    #[serde(default)]
    pub task: Option<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyStudyRecord {
    pub study_time_secs: u64,
    pub break_time_secs: u64,
    pub pomodoros: u32,
    pub sessions: Vec<SessionLogEntry>,
}

impl DailyStudyRecord {
    pub fn add_study_secs(&mut self, secs: u64) {
        self.study_time_secs = self.study_time_secs.saturating_add(secs);
    }

    pub fn add_break_secs(&mut self, secs: u64) {
        self.break_time_secs = self.break_time_secs.saturating_add(secs);
    }

    pub fn log_session(&mut self, entry: SessionLogEntry) {
        self.sessions.push(entry);
    }
}

/// Aggregate over one or more days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyStats {
    pub study_time_secs: u64,
    pub break_time_secs: u64,
    pub pomodoros: u64,
    pub sessions: u64,
    pub active_days: u64,
}

impl StudyStats {
    fn accumulate(&mut self, record: &DailyStudyRecord) {
        self.study_time_secs += record.study_time_secs;
        self.break_time_secs += record.break_time_secs;
        self.pomodoros += u64::from(record.pomodoros);
        self.sessions += record.sessions.len() as u64;
        if record.study_time_secs > 0 || record.pomodoros > 0 {
            self.active_days += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyRecords {
    days: BTreeMap<NaiveDate, DailyStudyRecord>,
}

impl StudyRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DailyStudyRecord> {
        self.days.get(&date)
    }

    /// Record for `date`, created empty on first use.
    pub fn day_mut(&mut self, date: NaiveDate) -> &mut DailyStudyRecord {
        self.days.entry(date).or_default()
    }

    pub fn stats_for(&self, date: NaiveDate) -> StudyStats {
        let mut stats = StudyStats::default();
        if let Some(record) = self.days.get(&date) {
            stats.accumulate(record);
        }
        stats
    }

    /// Stats over `from..=to`.
    pub fn stats_between(&self, from: NaiveDate, to: NaiveDate) -> StudyStats {
        let mut stats = StudyStats::default();
        if from > to {
            return stats;
        }
        for record in self.days.range(from..=to).map(|(_, r)| r) {
            stats.accumulate(record);
        }
        stats
    }

    pub fn stats_all(&self) -> StudyStats {
        let mut stats = StudyStats::default();
        for record in self.days.values() {
            stats.accumulate(record);
        }
        stats
    }
}
