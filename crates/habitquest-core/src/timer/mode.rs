use serde::{Deserialize, Serialize};

use crate::storage::TimerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerMode {
    Work,
    Break,
    LongBreak,
}

impl TimerMode {
    /// Configured duration in minutes.
    pub fn duration_min(self, config: &TimerConfig) -> u32 {
        match self {
            TimerMode::Work => config.work_minutes,
            TimerMode::Break => config.break_minutes,
            TimerMode::LongBreak => config.long_break_minutes,
        }
    }

    /// Configured duration in seconds. A zero-minute setting counts as one
    /// minute so a session always has a positive length.
    pub fn duration_secs(self, config: &TimerConfig) -> u64 {
        u64::from(self.duration_min(config).max(1)).saturating_mul(60)
    }

    pub fn is_break(self) -> bool {
        !matches!(self, TimerMode::Work)
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Work => "work session",
            TimerMode::Break => "break",
            TimerMode::LongBreak => "long break",
        }
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TimerMode::Work => "work",
            TimerMode::Break => "break",
            TimerMode::LongBreak => "long-break",
        })
    }
}

impl std::str::FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(TimerMode::Work),
            "break" => Ok(TimerMode::Break),
            "long-break" | "long_break" | "longbreak" => Ok(TimerMode::LongBreak),
            other => Err(format!("unknown timer mode: {other}")),
        }
    }
}
