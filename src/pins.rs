//! GPIO / peripheral pin assignments for the reader board (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Tag reader (PN532 over SPI)
// ---------------------------------------------------------------------------

pub const SPI_SCK_GPIO: i32 = 0;
pub const SPI_MISO_GPIO: i32 = 1;
pub const SPI_MOSI_GPIO: i32 = 2;
/// Chip select for the reader, active LOW.
pub const NFC_CS_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// WS2812B ring data line (driven by RMT channel 0).
pub const LED_RING_GPIO: i32 = 34;

/// Passive piezo buzzer, LEDC square wave.
pub const BUZZER_GPIO: i32 = 35;
/// LEDC resolution for the buzzer; duty 128 is a 50% square wave.
pub const BUZZER_DUTY_BITS: u32 = 8;
/// Timer frequency before the first tone is played.
pub const BUZZER_IDLE_FREQ_HZ: u32 = 1000;
