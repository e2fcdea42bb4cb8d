//! Outbound scan events.
//!
//! The [`TagScanner`](crate::scanner::TagScanner) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, forward to an uplink,
//! or record them in a test.

use crate::error::QueueError;
use crate::queue::record::TagId;

/// Structured events emitted by the scan loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// The reader chip answered and scanning resumed.
    ReaderConnected,

    /// A poll failed and the chip no longer reports its firmware version.
    ReaderLost,

    /// A reconnect attempt failed.  Carries the failure streak and
    /// whether a cooldown pause preceded the attempt.
    ReconnectFailed { failures: u32, cooled_down: bool },

    /// A new tag was detected and appended to the outbox.
    TagRecorded { tag: TagId, detected_at: u64, authorized: bool },

    /// A new tag was detected but the outbox refused the record.
    StorageFailed { tag: TagId, error: QueueError },

    /// The reader returned an id outside the accepted 4–10 byte range.
    MalformedTag { len: usize },
}
