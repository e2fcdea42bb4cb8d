//! Tag ids, read events and the one-line text record they persist as.
//!
//! ```text
//!   UID:04A1B2C3,Time:123456\n
//!       ^^^^^^^^      ^^^^^^
//!       hex id        ms since boot
//! ```
//!
//! The queue always writes uppercase hex; lowercase is accepted on read so
//! hand-edited or foreign files still decode.

use core::fmt;
use core::str::FromStr;

use crate::error::RecordError;

/// Longest tag id the queue stores (ISO 14443 triple-size UID).
pub const MAX_TAG_LEN: usize = 10;

/// Shortest id the reader is trusted to return (single-size UID).
pub const MIN_READER_TAG_LEN: usize = 4;

const UID_PREFIX: &str = "UID:";
const TIME_SEPARATOR: &str = ",Time:";

// ── TagId ─────────────────────────────────────────────────────

/// Opaque tag identifier: 1–10 raw bytes, displayed as uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagId(heapless::Vec<u8, MAX_TAG_LEN>);

impl TagId {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        if bytes.is_empty() {
            return Err(RecordError::BadLength(0));
        }
        heapless::Vec::from_slice(bytes)
            .map(Self)
            .map_err(|_| RecordError::BadLength(bytes.len()))
    }

    /// Decode a hex string of either case.
    pub fn parse_hex(hex: &str) -> Result<Self, RecordError> {
        let digits = hex.as_bytes();
        if digits.is_empty() || digits.len() % 2 != 0 {
            return Err(RecordError::BadHex);
        }
        let len = digits.len() / 2;
        if len > MAX_TAG_LEN {
            return Err(RecordError::BadLength(len));
        }
        let mut bytes = heapless::Vec::<u8, MAX_TAG_LEN>::new();
        for pair in digits.chunks_exact(2) {
            let byte = (nibble(pair[0])? << 4) | nibble(pair[1])?;
            bytes.push(byte).map_err(|_| RecordError::BadLength(len))?;
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for the 4, 7 and 10 byte UIDs (and anything in between) a
    /// reader can legitimately produce.
    pub fn is_reader_length(&self) -> bool {
        (MIN_READER_TAG_LEN..=MAX_TAG_LEN).contains(&self.0.len())
    }
}

fn nibble(c: u8) -> Result<u8, RecordError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(RecordError::BadHex),
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

impl FromStr for TagId {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

// ── ReadEvent ─────────────────────────────────────────────────

/// One detection of a tag, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadEvent {
    pub tag_id: TagId,
    /// Milliseconds since boot at the moment of detection.
    pub detected_at: u64,
}

// ── Record ────────────────────────────────────────────────────

/// A decoded queue line together with its exact on-disk text.
///
/// The text is what `dequeue` compares against, so two records with the
/// same event but different hex case are *different* records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    line: String,
    event: ReadEvent,
}

impl Record {
    /// Canonical (uppercase) record for a fresh event.
    pub fn new(event: ReadEvent) -> Self {
        let line = format!(
            "{UID_PREFIX}{}{TIME_SEPARATOR}{}",
            event.tag_id, event.detected_at
        );
        Self { line, event }
    }

    /// Decode one line.  The `\n` terminator must already be stripped; a
    /// trailing `\r` is tolerated and not kept.
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let body = line.strip_prefix(UID_PREFIX).ok_or(RecordError::BadLayout)?;
        let (hex, time) = body.split_once(TIME_SEPARATOR).ok_or(RecordError::BadLayout)?;

        let tag_id = TagId::parse_hex(hex)?;
        if time.is_empty() || !time.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RecordError::BadTimestamp);
        }
        let detected_at = time.parse::<u64>().map_err(|_| RecordError::BadTimestamp)?;

        Ok(Self {
            line: line.to_owned(),
            event: ReadEvent { tag_id, detected_at },
        })
    }

    pub fn parse_bytes(line: &[u8]) -> Result<Self, RecordError> {
        let text = core::str::from_utf8(line).map_err(|_| RecordError::NotText)?;
        Self::parse(text)
    }

    /// Line text without terminator.
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn event(&self) -> &ReadEvent {
        &self.event
    }

    pub fn tag_id(&self) -> &TagId {
        &self.event.tag_id
    }

    pub fn detected_at(&self) -> u64 {
        self.event.detected_at
    }

    /// The bytes appended to storage: line plus `\n`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.line.len() + 1);
        out.extend_from_slice(self.line.as_bytes());
        out.push(b'\n');
        out
    }
}

impl From<ReadEvent> for Record {
    fn from(event: ReadEvent) -> Self {
        Self::new(event)
    }
}
