use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Chime, TimerMode};

/// Every state change in the engines produces an Event.
/// The tracker forwards them to the notifier; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    XpGained {
        amount: u64,
        total_xp: u64,
        at: DateTime<Utc>,
    },
    XpDeducted {
        amount: u64,
        total_xp: u64,
        at: DateTime<Utc>,
    },
    LevelUp {
        level: u32,
        max_hp: u32,
        at: DateTime<Utc>,
    },
    LevelDown {
        level: u32,
        hp: u32,
        at: DateTime<Utc>,
    },
    Damage {
        amount: u64,
        hp: u32,
        at: DateTime<Utc>,
    },
    Healed {
        amount: u64,
        hp: u32,
        at: DateTime<Utc>,
    },
    StreakUpdated {
        streak: u32,
        at: DateTime<Utc>,
    },
    TimerStarted {
        mode: TimerMode,
        session: u32,
        remaining_secs: u64,
        resumed: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    ModeChanged {
        mode: TimerMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        mode: TimerMode,
        next_mode: TimerMode,
        /// Session counter after the transition.
        session: u32,
        xp_awarded: u64,
        auto_started: bool,
        /// Alarm to play; `None` when sound is disabled.
        chime: Option<Chime>,
        at: DateTime<Utc>,
    },
    /// A snapshot could not be committed. In-memory state is kept.
    PersistenceFailed {
        key: String,
        message: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// When the transition that produced the event happened.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::XpGained { at, .. }
            | Event::XpDeducted { at, .. }
            | Event::LevelUp { at, .. }
            | Event::LevelDown { at, .. }
            | Event::Damage { at, .. }
            | Event::Healed { at, .. }
            | Event::StreakUpdated { at, .. }
            | Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at }
            | Event::ModeChanged { at, .. }
            | Event::SessionCompleted { at, .. }
            | Event::PersistenceFailed { at, .. } => *at,
        }
    }

    /// Whether the event should reach the user as a toast/banner.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Event::LevelUp { .. }
                | Event::LevelDown { .. }
                | Event::Damage { .. }
                | Event::SessionCompleted { .. }
                | Event::PersistenceFailed { .. }
        )
    }

    /// Short human-readable message for user-visible events.
    pub fn message(&self) -> Option<String> {
        match self {
            Event::LevelUp { level, .. } => Some(format!("Level up! Lv.{level}")),
            Event::LevelDown { level, .. } => Some(format!("Level down... Lv.{level}")),
            Event::Damage { amount, hp, .. } => Some(format!("Took damage: -{amount} HP ({hp} left)")),
            Event::SessionCompleted { mode, next_mode, .. } => Some(match mode {
                TimerMode::Work => format!("Work session complete! Time for a {}", next_mode.label()),
                TimerMode::Break => "Break over! Start the next work session".to_string(),
                TimerMode::LongBreak => "Long break over! Start a new cycle".to_string(),
            }),
            Event::PersistenceFailed { key, message, .. } => {
                Some(format!("Could not save '{key}': {message}"))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::LevelUp {
            level: 3,
            max_hp: 120,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "LevelUp");
        assert_eq!(json["level"], 3);
    }

    #[test]
    fn only_feedback_events_are_user_visible() {
        let now = Utc::now();
        assert!(Event::Damage { amount: 5, hp: 95, at: now }.is_user_visible());
        assert!(!Event::XpGained { amount: 5, total_xp: 5, at: now }.is_user_visible());
        assert!(!Event::TimerReset { at: now }.is_user_visible());
    }

    #[test]
    fn session_message_depends_on_completed_mode() {
        let event = Event::SessionCompleted {
            mode: TimerMode::Work,
            next_mode: TimerMode::LongBreak,
            session: 1,
            xp_awarded: 15,
            auto_started: false,
            chime: None,
            at: Utc::now(),
        };
        assert_eq!(
            event.message().as_deref(),
            Some("Work session complete! Time for a long break")
        );
    }
}
