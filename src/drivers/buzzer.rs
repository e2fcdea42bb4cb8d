//! Passive piezo buzzer on an LEDC channel.
//!
//! A tone is a square wave: the LEDC timer frequency sets the pitch and the
//! duty sets the loudness (50% is the loudest a piezo gets).  `volume`
//! 0–255 maps linearly onto duty 0–50%.

use log::debug;

use crate::app::ports::AudioPort;

/// Duty at full volume (half of the 8-bit range).
const MAX_DUTY: u32 = 1 << (crate::pins::BUZZER_DUTY_BITS - 1);

pub fn volume_to_duty(volume: u8) -> u32 {
    u32::from(volume) * MAX_DUTY / 255
}

pub struct Buzzer {
    sounding: Option<u32>,
}

impl Default for Buzzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buzzer {
    /// Expects [`hw_init::init_buzzer`](super::hw_init::init_buzzer) to
    /// have configured the LEDC timer and channel.
    pub fn new() -> Self {
        Self { sounding: None }
    }

    /// Frequency currently sounding, if any.
    pub fn sounding(&self) -> Option<u32> {
        self.sounding
    }
}

impl AudioPort for Buzzer {
    fn tone(&mut self, frequency_hz: u32, volume: u8) {
        debug!("Buzzer: {}Hz vol={}", frequency_hz, volume);
        super::hw_init::buzzer_set(frequency_hz, volume_to_duty(volume));
        self.sounding = Some(frequency_hz);
    }

    fn silence(&mut self) {
        super::hw_init::buzzer_set(0, 0);
        self.sounding = None;
    }
}
