//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured scan events to the
//! ESP-IDF logger (UART / USB-CDC in production).  An uplink adapter would
//! implement the same trait.

use log::{info, warn};

use crate::app::events::ScanEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ScanEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::ReaderConnected => info!("READER | connected"),
            ScanEvent::ReaderLost => warn!("READER | lost"),
            ScanEvent::ReconnectFailed {
                failures,
                cooled_down,
            } => {
                info!(
                    "READER | reconnect failed, streak={} cooldown={}",
                    failures, cooled_down
                );
            }
            ScanEvent::TagRecorded {
                tag,
                detected_at,
                authorized,
            } => {
                info!(
                    "SCAN | uid={} t={}ms access={}",
                    tag,
                    detected_at,
                    if *authorized { "granted" } else { "denied" }
                );
            }
            ScanEvent::StorageFailed { tag, error } => {
                warn!("SCAN | uid={} NOT STORED: {}", tag, error);
            }
            ScanEvent::MalformedTag { len } => {
                warn!("SCAN | reader returned {}-byte id, ignored", len);
            }
        }
    }
}
