//! # HabitQuest Core Library
//!
//! Core logic for HabitQuest, a habit tracker that turns tasks and Pomodoro
//! sessions into XP, levels and HP. Every operation is available through the
//! standalone `habitquest` CLI built on this crate.
//!
//! ## Architecture
//!
//! - **Progression Engine**: XP, level curve, HP/damage and streak rules over
//!   a single [`PlayerState`]
//! - **Timer Engine**: a tick-driven Pomodoro state machine; the caller
//!   invokes `tick()` once per second
//! - **Storage**: SQLite key/value snapshots and TOML configuration
//! - **Tracker**: owns both engines, commits snapshots and forwards events
//!
//! ## Key Components
//!
//! - [`ProgressionEngine`]: player progression rules
//! - [`TimerEngine`]: Pomodoro state machine
//! - [`Tracker`]: command surface used by the CLI
//! - [`Database`]: snapshot persistence
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod progression;
pub mod records;
pub mod storage;
pub mod timer;
pub mod tracker;

pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use progression::{LevelProgress, PlayerState, Priority, ProgressionEngine};
pub use records::{DailyStudyRecord, StudyRecords, StudyStats};
pub use storage::{Config, Database, MemoryStore, Storage};
pub use timer::{Chime, SessionCompletion, TimerEngine, TimerMode, TimerState, TimerStatus};
pub use tracker::{Outcome, Tracker};
