//! Unified error types for the tag reader firmware.
//!
//! Port-level failures ([`StorageError`], [`ConfigError`]) live next to the
//! port traits in [`crate::app::ports`]; this module holds the domain errors
//! and the crate-wide [`Error`] every subsystem converts into.  All variants
//! are `Copy` so they travel through the scan loop and event sink without
//! allocation.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The durable scan queue rejected an operation.
    Queue(QueueError),
    /// A persisted record line could not be decoded.
    Record(RecordError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queue(e) => write!(f, "queue: {e}"),
            Self::Record(e) => write!(f, "record: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Queue errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The backing file could not be opened, read or written.
    StorageUnavailable(StorageError),
    /// `dequeue` was handed a record that is no longer at the head of the
    /// queue.  Storage is left untouched; the consumer should re-peek.
    ConsumerDesync,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageUnavailable(e) => write!(f, "storage unavailable ({e})"),
            Self::ConsumerDesync => write!(f, "head record does not match expected"),
        }
    }
}

impl From<StorageError> for QueueError {
    fn from(e: StorageError) -> Self {
        Self::StorageUnavailable(e)
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Self::Queue(e)
    }
}

// ---------------------------------------------------------------------------
// Record decoding errors
// ---------------------------------------------------------------------------

/// Why a persisted line is not a well-formed `UID:<hex>,Time:<ms>` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// Line is not valid UTF-8.
    NotText,
    /// Missing `UID:` prefix or `,Time:` separator.
    BadLayout,
    /// Tag id is not an even-length run of hex digits.
    BadHex,
    /// Tag id decodes to zero or more than ten bytes.
    BadLength(usize),
    /// Timestamp is not a plain unsigned decimal that fits in 64 bits.
    BadTimestamp,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotText => write!(f, "not UTF-8 text"),
            Self::BadLayout => write!(f, "expected UID:<hex>,Time:<ms>"),
            Self::BadHex => write!(f, "tag id is not hex"),
            Self::BadLength(n) => write!(f, "tag id has {n} bytes, expected 1-10"),
            Self::BadTimestamp => write!(f, "timestamp is not an unsigned integer"),
        }
    }
}

impl From<RecordError> for Error {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
