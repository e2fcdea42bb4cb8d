//! Reader adapters.

use core::time::Duration;

use crate::app::ports::{RawTag, ReaderPort};

/// A reader that is never there.
///
/// Keeps the scanner in its reconnect/backoff loop (ring shows Loading)
/// on boards without a reader fitted.
// TODO: PN532 SPI adapter on the pins in `pins.rs` (CS = GPIO3).
#[derive(Debug, Default)]
pub struct NullReader;

impl ReaderPort for NullReader {
    fn poll(&mut self, _timeout: Duration) -> Option<RawTag> {
        None
    }

    fn reconnect(&mut self) -> bool {
        false
    }

    fn firmware_present(&mut self) -> bool {
        false
    }
}
