//! Durable, crash-tolerant FIFO of scan records ("the outbox").
//!
//! One text file, one record per `\n`-terminated line, oldest first.
//!
//! ```text
//!   scanner ──enqueue──▶ /outbox.txt ──peek/dequeue──▶ uploader
//!                        UID:04A1B2C3,Time:1200
//!                        UID:04FF0011,Time:9310
//!                        UID:0455         ◀── torn append, invisible
//! ```
//!
//! ## Guarantees
//!
//! - Readers only ever see complete lines.  A trailing fragment left by a
//!   power cut mid-append is ignored, and cut off by [`DurableQueue::open`]
//!   before anything is appended after it.
//! - Malformed lines are skipped (and logged) by `peek`/`len`; the next
//!   successful `dequeue` drops them together with the head record.
//! - `dequeue` removes the head record only if the caller hands back that
//!   exact line, so a consumer acting on stale data cannot delete a record
//!   it never saw.
//! - Every rewrite goes to `<path>.tmp` first and is renamed over the queue
//!   file, so a crash leaves either the old or the new contents.  Where the
//!   filesystem needs the target removed before the rename, a temp file
//!   found without its queue file holds the live contents: reads see it,
//!   and it is promoted before the next write.
//!
//! All methods take `&mut self`; share one queue between the scanner and
//! an uploader through a mutex (see the [`EventLog`] impl below).

pub mod record;

use std::io::Read;
use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::app::ports::{EventLog, FileSystem, StorageError};
use crate::error::QueueError;
use record::{ReadEvent, Record, TagId};

/// Default location on the flash filesystem.
pub const DEFAULT_QUEUE_PATH: &str = "/outbox.txt";

/// The outbox.  Exclusively owns its storage handle.
pub struct DurableQueue<F: FileSystem> {
    fs: F,
    path: String,
    tmp_path: String,
    /// Set when an append may have left a fragment behind.
    needs_repair: bool,
}

impl<F: FileSystem> DurableQueue<F> {
    /// Open the queue at `path`, repairing a torn tail if there is one.
    ///
    /// Never fails: if storage is unreachable now, repair is retried before
    /// the next append and the error surfaces from that call instead.
    pub fn open(fs: F, path: &str) -> Self {
        let mut queue = Self {
            fs,
            path: path.to_owned(),
            tmp_path: format!("{path}.tmp"),
            needs_repair: true,
        };
        if let Err(e) = queue.repair() {
            warn!("Queue: recovery of {} deferred: {}", queue.path, e);
        }
        queue
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append one record for `tag_id` detected at `detected_at`.
    pub fn enqueue(&mut self, tag_id: &TagId, detected_at: u64) -> Result<(), QueueError> {
        if self.needs_repair {
            self.repair()?;
        }
        self.promote_orphan()?;
        if !self.fs.exists(&self.path) {
            self.fs.write(&self.path, b"")?;
        }

        let record = Record::new(ReadEvent {
            tag_id: tag_id.clone(),
            detected_at,
        });
        if let Err(e) = self.fs.append(&self.path, &record.to_bytes()) {
            self.needs_repair = true;
            return Err(e.into());
        }
        debug!("Queue: + {}", record.line());
        Ok(())
    }

    /// The oldest well-formed record, or `None` if the queue is empty.
    /// Does not modify storage.
    pub fn peek(&self) -> Result<Option<Record>, QueueError> {
        let Some(buf) = self.read_all()? else {
            return Ok(None);
        };
        Ok(first_record(&buf).map(|(record, _)| record))
    }

    /// Remove the head record, provided it is still `expected`.
    ///
    /// Returns [`QueueError::ConsumerDesync`] and leaves storage
    /// byte-identical if the head is anything else (or the queue is empty).
    pub fn dequeue(&mut self, expected: &Record) -> Result<(), QueueError> {
        self.promote_orphan()?;
        let Some(buf) = self.read_all()? else {
            return Err(QueueError::ConsumerDesync);
        };
        let Some((head, end)) = first_record(&buf) else {
            return Err(QueueError::ConsumerDesync);
        };
        if head.line() != expected.line() {
            debug!(
                "Queue: desync, head is '{}' but consumer expected '{}'",
                head.line(),
                expected.line()
            );
            return Err(QueueError::ConsumerDesync);
        }

        // Drop anything after the last newline along with the head; a
        // fragment here only exists if an earlier append failed.
        let rest = &buf[end..];
        let keep = rest.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        self.needs_repair = true;
        self.replace_contents(&rest[..keep])?;
        self.needs_repair = false;
        debug!("Queue: - {}", head.line());
        Ok(())
    }

    /// Number of well-formed records waiting.
    pub fn len(&self) -> Result<usize, QueueError> {
        let Some(buf) = self.read_all()? else {
            return Ok(0);
        };
        Ok(complete_lines(&buf)
            .filter(|(line, _)| Record::parse_bytes(line).is_ok())
            .count())
    }

    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.peek()?.is_none())
    }

    /// Finish or discard an interrupted rewrite, then cut off a trailing
    /// unterminated fragment.  Returns `true` when something was removed.
    pub fn repair(&mut self) -> Result<bool, QueueError> {
        self.settle_tmp()?;
        let Some(buf) = self.read_all()? else {
            self.needs_repair = false;
            return Ok(false);
        };
        if buf.is_empty() || buf.ends_with(b"\n") {
            self.needs_repair = false;
            return Ok(false);
        }

        let keep = buf.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        warn!(
            "Queue: discarding {}-byte torn record at end of {}",
            buf.len() - keep,
            self.path
        );
        self.needs_repair = true;
        self.replace_contents(&buf[..keep])?;
        self.needs_repair = false;
        Ok(true)
    }

    /// Hand the storage handle back (used by tests to inspect the file).
    pub fn into_inner(self) -> F {
        self.fs
    }

    pub fn storage(&self) -> &F {
        &self.fs
    }

    /// The temp file is fully written before the queue file is touched, so
    /// an orphan is the newer contents and a tmp beside the queue is stale.
    fn settle_tmp(&mut self) -> Result<(), QueueError> {
        if !self.fs.exists(&self.tmp_path) {
            return Ok(());
        }
        if self.fs.exists(&self.path) {
            warn!("Queue: removing stale {}", self.tmp_path);
            self.fs.remove(&self.tmp_path)?;
            Ok(())
        } else {
            self.promote_orphan()
        }
    }

    /// A rewrite that lost its queue file between remove and rename left
    /// the live contents in the temp file; move them back before writing.
    fn promote_orphan(&mut self) -> Result<(), QueueError> {
        if !self.fs.exists(&self.path) && self.fs.exists(&self.tmp_path) {
            warn!("Queue: promoting orphaned {}", self.tmp_path);
            self.fs.rename(&self.tmp_path, &self.path)?;
        }
        Ok(())
    }

    /// Path holding the current contents, if any.
    fn live_path(&self) -> Option<&str> {
        if self.fs.exists(&self.path) {
            Some(&self.path)
        } else if self.fs.exists(&self.tmp_path) {
            Some(&self.tmp_path)
        } else {
            None
        }
    }

    fn read_all(&self) -> Result<Option<Vec<u8>>, QueueError> {
        let Some(path) = self.live_path() else {
            return Ok(None);
        };
        let mut reader = match self.fs.open_read(path) {
            Ok(r) => r,
            Err(StorageError::NotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| QueueError::StorageUnavailable(e.into()))?;
        Ok(Some(buf))
    }

    /// Crash-safe replace: write the temp file, then rename it over the
    /// queue.  An empty queue is represented by an absent file.
    fn replace_contents(&mut self, data: &[u8]) -> Result<(), QueueError> {
        if data.is_empty() {
            self.fs.remove(&self.tmp_path)?;
            self.fs.remove(&self.path)?;
            return Ok(());
        }
        self.fs.write(&self.tmp_path, data)?;
        self.fs.rename(&self.tmp_path, &self.path)?;
        Ok(())
    }
}

impl<F: FileSystem> EventLog for DurableQueue<F> {
    fn record(&mut self, tag: &TagId, detected_at: u64) -> Result<(), QueueError> {
        self.enqueue(tag, detected_at)
    }
}

impl<T: EventLog> EventLog for Arc<Mutex<T>> {
    fn record(&mut self, tag: &TagId, detected_at: u64) -> Result<(), QueueError> {
        let mut inner = self
            .lock()
            .map_err(|_| QueueError::StorageUnavailable(StorageError::Unavailable))?;
        inner.record(tag, detected_at)
    }
}

/// Complete (newline-terminated) lines of `buf` with the offset just past
/// each terminator.  A final unterminated fragment is not yielded.
fn complete_lines(buf: &[u8]) -> impl Iterator<Item = (&[u8], usize)> {
    let mut pos = 0;
    core::iter::from_fn(move || {
        let nl = buf[pos..].iter().position(|&b| b == b'\n')?;
        let line = &buf[pos..pos + nl];
        pos += nl + 1;
        Some((line, pos))
    })
}

/// First well-formed record and the offset just past its line.
fn first_record(buf: &[u8]) -> Option<(Record, usize)> {
    for (line, end) in complete_lines(buf) {
        match Record::parse_bytes(line) {
            Ok(record) => return Some((record, end)),
            Err(e) => warn!(
                "Queue: skipping malformed line '{}': {}",
                String::from_utf8_lossy(line),
                e
            ),
        }
    }
    None
}
