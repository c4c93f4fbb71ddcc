mod chime;
mod engine;
mod mode;

pub use chime::{Chime, Waveform};
pub use engine::{
    format_clock, SessionCompletion, TimerContext, TimerEngine, TimerState, TimerStatus,
    UnsavedTime, POMODORO_XP,
};
pub use mode::TimerMode;
