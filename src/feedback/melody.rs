//! Tick-driven melody sequencer.
//!
//! A melody is an owned list of [`Note`]s.  The player is advanced once per
//! render frame and only touches the buzzer at note boundaries, so a
//! melody never blocks the frame cadence or the scan loop.

use serde::{Deserialize, Serialize};

use crate::app::ports::AudioPort;

/// One note.  `frequency_hz == 0` or `volume == 0` is a rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    /// 0–255, mapped onto PWM duty by the buzzer driver.
    pub volume: u8,
}

impl Note {
    pub const fn new(frequency_hz: u32, duration_ms: u32, volume: u8) -> Self {
        Self {
            frequency_hz,
            duration_ms,
            volume,
        }
    }

    pub const fn rest(duration_ms: u32) -> Self {
        Self::new(0, duration_ms, 0)
    }

    pub const fn is_rest(&self) -> bool {
        self.frequency_hz == 0 || self.volume == 0
    }
}

/// Plays one melody at a time; starting a new one replaces the current.
#[derive(Debug, Default)]
pub struct MelodyPlayer {
    notes: Vec<Note>,
    next: usize,
    /// Ticks left on the sounding note.
    remaining: u32,
    playing: bool,
}

impl MelodyPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `melody` from the top.  The first note sounds on the next tick.
    pub fn start(&mut self, melody: &[Note]) {
        self.notes.clear();
        self.notes.extend_from_slice(melody);
        self.next = 0;
        self.remaining = 0;
        self.playing = !melody.is_empty();
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advance by one frame of `tick_ms`.
    pub fn tick<A: AudioPort>(&mut self, audio: &mut A, tick_ms: u32) {
        if !self.playing {
            return;
        }
        if self.remaining == 0 {
            let Some(note) = self.notes.get(self.next).copied() else {
                audio.silence();
                self.playing = false;
                return;
            };
            if note.is_rest() {
                audio.silence();
            } else {
                audio.tone(note.frequency_hz, note.volume);
            }
            self.remaining = note.duration_ms.div_ceil(tick_ms.max(1)).max(1);
            self.next += 1;
        }
        self.remaining -= 1;
    }

    /// Cut the current melody short.
    pub fn stop<A: AudioPort>(&mut self, audio: &mut A) {
        if self.playing {
            audio.silence();
        }
        self.playing = false;
        self.notes.clear();
    }
}
