//! Reader configuration parameters
//!
//! All tunable parameters for the tag reader.  Stored as `config.json` on
//! the flash filesystem; missing or invalid files fall back to defaults.

use std::io::Read;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, FileSystem};
use crate::feedback::melody::Note;
use crate::feedback::render::{MAX_RING_LEN, Rgb};
use crate::queue::DEFAULT_QUEUE_PATH;

/// Where the configuration lives on the flash filesystem.
pub const CONFIG_PATH: &str = "/config.json";

/// Core reader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    // --- Reader ---
    /// Scan loop interval (milliseconds)
    pub scan_interval_ms: u32,
    /// Bounded wait for one detection attempt (milliseconds)
    pub read_timeout_ms: u32,
    /// Consecutive failures tolerated before reconnect attempts are paced
    pub failure_threshold: u32,
    /// Pause before each reconnect attempt once past the threshold (milliseconds)
    pub cooldown_ms: u32,

    // --- Feedback ---
    /// Render loop interval (milliseconds)
    pub frame_interval_ms: u32,
    /// Number of pixels on the ring
    pub ring_len: usize,
    /// Approval / denial flash length (milliseconds)
    pub flash_duration_ms: u32,
    /// Period of the waiting "breathing" pulse (milliseconds)
    pub breathing_period_ms: u32,
    pub approval_colour: Rgb,
    pub denial_colour: Rgb,
    pub waiting_colour: Rgb,
    pub loading_colour: Rgb,
    pub approval_melody: Vec<Note>,
    pub denial_melody: Vec<Note>,

    // --- Access ---
    /// Deny tags missing from `whitelist` (otherwise every tag is approved)
    pub enforce_whitelist: bool,
    /// Hex (`56E18D5A`) or dashed-decimal (`86-225-141-90`) tag ids
    pub whitelist: Vec<String>,

    // --- Storage ---
    /// Outbox file on the flash filesystem
    pub queue_path: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            // Reader
            scan_interval_ms: 10,
            read_timeout_ms: 100,
            failure_threshold: 5,
            cooldown_ms: 5000,

            // Feedback
            frame_interval_ms: 16, // ~60 fps
            ring_len: 24,
            flash_duration_ms: 700,
            breathing_period_ms: 2000,
            approval_colour: (0, 255, 0),
            denial_colour: (255, 0, 0),
            waiting_colour: (0, 0, 255),
            loading_colour: (0, 0, 255),
            approval_melody: vec![Note::new(700, 100, 200), Note::new(880, 100, 200)],
            denial_melody: vec![Note::new(430, 100, 200), Note::new(320, 100, 200)],

            // Access
            enforce_whitelist: false,
            whitelist: vec!["86-225-141-90".into()],

            // Storage
            queue_path: DEFAULT_QUEUE_PATH.into(),
        }
    }
}

impl ReaderConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.scan_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "scan_interval_ms must be 1–1000",
            ));
        }
        if !(1..=10_000).contains(&self.read_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "read_timeout_ms must be 1–10000",
            ));
        }
        if self.failure_threshold > 1000 {
            return Err(ConfigError::ValidationFailed(
                "failure_threshold must be 0–1000",
            ));
        }
        if self.cooldown_ms > 60_000 {
            return Err(ConfigError::ValidationFailed("cooldown_ms must be 0–60000"));
        }
        if !(5..=1000).contains(&self.frame_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "frame_interval_ms must be 5–1000",
            ));
        }
        if !(1..=MAX_RING_LEN).contains(&self.ring_len) {
            return Err(ConfigError::ValidationFailed("ring_len must be 1–64"));
        }
        if self.flash_duration_ms > 10_000 {
            return Err(ConfigError::ValidationFailed(
                "flash_duration_ms must be 0–10000",
            ));
        }
        if !(100..=60_000).contains(&self.breathing_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "breathing_period_ms must be 100–60000",
            ));
        }
        for note in self.approval_melody.iter().chain(&self.denial_melody) {
            if note.frequency_hz != 0 && !(20..=20_000).contains(&note.frequency_hz) {
                return Err(ConfigError::ValidationFailed(
                    "melody frequency must be 0 (rest) or 20–20000 Hz",
                ));
            }
            if note.duration_ms > 5000 {
                return Err(ConfigError::ValidationFailed(
                    "melody note duration must be 0–5000 ms",
                ));
            }
        }
        if self
            .whitelist
            .iter()
            .any(|e| crate::access::parse_entry(e).is_err())
        {
            return Err(ConfigError::ValidationFailed(
                "whitelist entries must be hex or dashed-decimal tag ids",
            ));
        }
        if !self.queue_path.starts_with('/') || self.queue_path.ends_with('/') {
            return Err(ConfigError::ValidationFailed(
                "queue_path must be an absolute file path",
            ));
        }
        Ok(())
    }

    /// Read and validate `path`.
    pub fn load<F: FileSystem>(fs: &F, path: &str) -> Result<Self, ConfigError> {
        if !fs.exists(path) {
            return Err(ConfigError::NotFound);
        }
        let mut buf = Vec::new();
        fs.open_read(path)?
            .read_to_end(&mut buf)
            .map_err(|_| ConfigError::IoError)?;
        let config: Self = serde_json::from_slice(&buf).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults on any failure.  A missing or
    /// unreadable file is replaced with the defaults so the next boot finds
    /// a valid one.
    pub fn load_or_default<F: FileSystem>(fs: &mut F, path: &str) -> Self {
        match Self::load(fs, path) {
            Ok(config) => {
                info!("Config loaded from {}", path);
                config
            }
            Err(e) => {
                warn!("Config load failed ({}), using defaults", e);
                let config = Self::default();
                if !matches!(e, ConfigError::ValidationFailed(_)) {
                    if let Err(e) = config.save(fs, path) {
                        warn!("Config: could not write defaults ({})", e);
                    }
                }
                config
            }
        }
    }

    /// Validate and persist.
    pub fn save<F: FileSystem>(&self, fs: &mut F, path: &str) -> Result<(), ConfigError> {
        self.validate()?;
        let json = serde_json::to_vec_pretty(self).map_err(|_| ConfigError::Corrupted)?;
        fs.write(path, &json)?;
        Ok(())
    }
}
