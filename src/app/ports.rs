//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ TagScanner / FeedbackController / DurableQueue
//! ```
//!
//! Driven adapters (reader chip, flash filesystem, pixel ring, buzzer,
//! clock, event sinks) implement these traits.  The domain types consume
//! them via generics, so the scan and feedback logic never touches
//! hardware directly and runs unchanged on the host under test.

use core::time::Duration;
use std::io;

use crate::app::events::ScanEvent;
use crate::error::QueueError;
use crate::feedback::BaseMode;
use crate::queue::record::TagId;

// ───────────────────────────────────────────────────────────────
// Reader port (driven adapter: tag reader chip → domain)
// ───────────────────────────────────────────────────────────────

/// Largest id a reader may hand back.  Anything above the 10 bytes a
/// triple-size UID can carry is rejected by the scanner.
pub const MAX_RAW_TAG: usize = 16;

/// Raw id bytes exactly as the reader reported them.
pub type RawTag = heapless::Vec<u8, MAX_RAW_TAG>;

/// Tag reader chip.
pub trait ReaderPort {
    /// One bounded detection attempt.  `None` means nothing answered
    /// within `timeout`, which is either "no tag" or "chip gone"; the
    /// scanner tells them apart with [`firmware_present`](Self::firmware_present).
    fn poll(&mut self, timeout: Duration) -> Option<RawTag>;

    /// Re-initialise the bus and the chip.  Returns `true` on success.
    fn reconnect(&mut self) -> bool;

    /// Probe the chip's firmware version register.
    fn firmware_present(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Filesystem port (driven adapter: domain ↔ flash filesystem)
// ───────────────────────────────────────────────────────────────

/// Minimal path-based file access on the on-board flash filesystem.
///
/// # Durability
///
/// - `append` MUST write its buffer with a single call so concurrent
///   appenders cannot interleave.  A power cut may still leave a prefix
///   of the buffer behind; readers are expected to cope.
/// - `rename` replaces `to`.  Where the filesystem cannot do that in one
///   step the adapter removes `to` first, and the queue's recovery on open
///   finishes the move.
pub trait FileSystem {
    fn exists(&self, path: &str) -> bool;

    /// Open a file for sequential reading.
    fn open_read(&self, path: &str) -> Result<Box<dyn io::Read + '_>, StorageError>;

    /// Append `data` to the end of `path`, creating it if absent.
    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Replace the contents of `path` with `data` (create or truncate).
    fn write(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Move `from` over `to`.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError>;

    /// Delete a file.  Returns `Ok(())` even if it didn't exist.
    fn remove(&mut self, path: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Output ports (domain → pixels / buzzer)
// ───────────────────────────────────────────────────────────────

/// Addressable ring of RGB pixels.  `set` stages, `commit` pushes the
/// whole frame to the strip.
pub trait LightPort {
    fn set(&mut self, position: usize, r: u8, g: u8, b: u8);
    fn commit(&mut self);
}

/// Piezo buzzer.
pub trait AudioPort {
    /// Start a continuous tone.  `volume` is 0–255.
    fn tone(&mut self, frequency_hz: u32, volume: u8);
    fn silence(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Time, events, access, feedback
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// The domain emits structured [`ScanEvent`]s through this port.  Adapters
/// decide where they go (serial log, uplink, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &ScanEvent);
}

/// Write-only view of the scan outbox.  The scanner only ever appends.
pub trait EventLog {
    fn record(&mut self, tag: &TagId, detected_at: u64) -> Result<(), QueueError>;
}

/// Decides whether a detected tag gets the approval or the denial flash.
pub trait AccessPolicy {
    fn is_authorized(&self, tag: &TagId) -> bool;
}

impl<F> AccessPolicy for F
where
    F: Fn(&TagId) -> bool,
{
    fn is_authorized(&self, tag: &TagId) -> bool {
        self(tag)
    }
}

/// Command side of the feedback engine, as seen from the scanner.
///
/// Calls never block: they post a request that the render task picks up
/// on its next frame.
pub trait FeedbackPort {
    fn approve(&self, duration_ms: u32);
    fn deny(&self, duration_ms: u32);
    fn set_base(&self, mode: BaseMode);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`FileSystem`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// File does not exist.
    NotFound,
    /// Partition is full.
    Full,
    /// Filesystem not mounted or refused access.
    Unavailable,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::Full => write!(f, "storage full"),
            Self::Unavailable => write!(f, "filesystem unavailable"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::StorageFull => Self::Full,
            io::ErrorKind::PermissionDenied => Self::Unavailable,
            _ => Self::IoError,
        }
    }
}

/// Errors from loading or validating [`ReaderConfig`](crate::config::ReaderConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config is not valid JSON for the current schema.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            _ => Self::IoError,
        }
    }
}
