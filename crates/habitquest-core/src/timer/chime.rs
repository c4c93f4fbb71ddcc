//! Alarm patterns played when a session ends.
//!
//! The engine only describes the sound; playing it is up to the front end.

use serde::{Deserialize, Serialize};

use super::mode::TimerMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chime {
    pub waveform: Waveform,
    /// Notes played in order.
    pub frequencies_hz: Vec<u32>,
    /// Delay between note onsets.
    pub spacing_ms: u32,
    pub note_ms: u32,
    /// 0.0 .. 1.0
    pub gain: f32,
}

impl Chime {
    /// Distinct pattern for the mode that just finished.
    pub fn for_completed(mode: TimerMode) -> Self {
        match mode {
            // rising C-E-G
            TimerMode::Work => Chime {
                waveform: Waveform::Sine,
                frequencies_hz: vec![523, 659, 784],
                spacing_ms: 150,
                note_ms: 300,
                gain: 0.3,
            },
            TimerMode::Break => Chime {
                waveform: Waveform::Triangle,
                frequencies_hz: vec![440, 523],
                spacing_ms: 250,
                note_ms: 400,
                gain: 0.25,
            },
            TimerMode::LongBreak => Chime {
                waveform: Waveform::Sine,
                frequencies_hz: vec![330, 392, 494],
                spacing_ms: 300,
                note_ms: 500,
                gain: 0.2,
            },
        }
    }

    /// Total playback time.
    pub fn duration_ms(&self) -> u32 {
        let notes = self.frequencies_hz.len() as u32;
        if notes == 0 {
            return 0;
        }
        (notes - 1) * self.spacing_ms + self.note_ms
    }
}
