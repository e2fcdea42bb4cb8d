//! Mock adapters for integration tests.
//!
//! Each mock records what the domain asked of it so tests can assert on
//! the full call history without a reader chip, flash or LED strip.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use tagreader::adapters::fs::MemFs;
use tagreader::app::events::ScanEvent;
use tagreader::app::ports::{
    AudioPort, Clock, EventSink, FeedbackPort, FileSystem, LightPort, RawTag, ReaderPort,
    StorageError,
};
use tagreader::feedback::BaseMode;

// ── FaultyFs ──────────────────────────────────────────────────

/// [`MemFs`] with switchable failures.
#[derive(Default)]
pub struct FaultyFs {
    pub inner: MemFs,
    /// Every operation fails with `Unavailable`.
    pub offline: bool,
    /// Appends fail with `Full`.
    pub full: bool,
    /// The next append writes only this many bytes, then fails
    /// (power cut mid-write).
    pub tear_next_append: Option<usize>,
    /// The next rename deletes its target, then fails (SPIFFS losing
    /// power or space between the two steps).
    pub break_next_rename: bool,
}

#[allow(dead_code)]
impl FaultyFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self, path: &str) -> Vec<u8> {
        self.inner.contents(path).map(<[u8]>::to_vec).unwrap_or_default()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.offline {
            Err(StorageError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl FileSystem for FaultyFs {
    fn exists(&self, path: &str) -> bool {
        !self.offline && self.inner.exists(path)
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn io::Read + '_>, StorageError> {
        self.check()?;
        self.inner.open_read(path)
    }

    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.check()?;
        if self.full {
            return Err(StorageError::Full);
        }
        if let Some(n) = self.tear_next_append.take() {
            self.inner.append(path, &data[..n.min(data.len())])?;
            return Err(StorageError::IoError);
        }
        self.inner.append(path, data)
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.check()?;
        self.inner.write(path, data)
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError> {
        self.check()?;
        if core::mem::take(&mut self.break_next_rename) {
            self.inner.remove(to)?;
            return Err(StorageError::IoError);
        }
        self.inner.rename(from, to)
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        self.check()?;
        self.inner.remove(path)
    }
}

// ── MockReader ────────────────────────────────────────────────

/// One scripted poll result.
#[derive(Debug, Clone)]
pub enum Poll {
    Tag(Vec<u8>),
    Empty,
    /// No answer and the firmware probe fails.
    Fault,
}

/// Reader that plays back a script.  Once the script runs out every poll
/// is empty.
pub struct MockReader {
    pub script: VecDeque<Poll>,
    pub reconnect_ok: bool,
    pub reconnects: u32,
    pub timeouts: Vec<Duration>,
    present: bool,
}

#[allow(dead_code)]
impl MockReader {
    pub fn new(script: impl IntoIterator<Item = Poll>) -> Self {
        Self {
            script: script.into_iter().collect(),
            reconnect_ok: true,
            reconnects: 0,
            timeouts: Vec::new(),
            present: false,
        }
    }

    /// A reader whose chip never answers.
    pub fn absent() -> Self {
        let mut r = Self::new(Vec::<Poll>::new());
        r.reconnect_ok = false;
        r
    }
}

impl ReaderPort for MockReader {
    fn poll(&mut self, timeout: Duration) -> Option<RawTag> {
        self.timeouts.push(timeout);
        match self.script.pop_front().unwrap_or(Poll::Empty) {
            Poll::Tag(bytes) => Some(RawTag::from_slice(&bytes).unwrap()),
            Poll::Empty => None,
            Poll::Fault => {
                self.present = false;
                None
            }
        }
    }

    fn reconnect(&mut self) -> bool {
        self.reconnects += 1;
        self.present = self.reconnect_ok;
        self.reconnect_ok
    }

    fn firmware_present(&mut self) -> bool {
        self.present
    }
}

// ── MockDelay / FixedClock ────────────────────────────────────

/// Records requested pauses instead of sleeping.
#[derive(Default)]
pub struct MockDelay {
    pub pauses_ms: Vec<u32>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.pauses_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.pauses_ms.push(ms);
    }
}

pub struct FixedClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl FixedClock {
    pub fn at(ms: u64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ── RecordingSink / RecordingFeedback ─────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<ScanEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ScanEvent) {
        self.events.push(event.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCall {
    Approve(u32),
    Deny(u32),
    SetBase(BaseMode),
}

#[derive(Default)]
pub struct RecordingFeedback {
    pub calls: RefCell<Vec<FeedbackCall>>,
}

#[allow(dead_code)]
impl RecordingFeedback {
    /// Approve/deny calls only.
    pub fn flashes(&self) -> Vec<FeedbackCall> {
        self.calls
            .borrow()
            .iter()
            .copied()
            .filter(|c| !matches!(c, FeedbackCall::SetBase(_)))
            .collect()
    }

    pub fn last_base(&self) -> Option<BaseMode> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            FeedbackCall::SetBase(m) => Some(*m),
            _ => None,
        })
    }
}

impl FeedbackPort for RecordingFeedback {
    fn approve(&self, duration_ms: u32) {
        self.calls.borrow_mut().push(FeedbackCall::Approve(duration_ms));
    }

    fn deny(&self, duration_ms: u32) {
        self.calls.borrow_mut().push(FeedbackCall::Deny(duration_ms));
    }

    fn set_base(&self, mode: BaseMode) {
        self.calls.borrow_mut().push(FeedbackCall::SetBase(mode));
    }
}

// ── MockLight / MockAudio ─────────────────────────────────────

pub type Rgb = (u8, u8, u8);

/// Keeps every committed frame.
pub struct MockLight {
    staged: Vec<Rgb>,
    pub frames: Vec<Vec<Rgb>>,
}

#[allow(dead_code)]
impl MockLight {
    pub fn new(len: usize) -> Self {
        Self {
            staged: vec![(0, 0, 0); len],
            frames: Vec::new(),
        }
    }

    pub fn last_frame(&self) -> &[Rgb] {
        self.frames.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl LightPort for MockLight {
    fn set(&mut self, position: usize, r: u8, g: u8, b: u8) {
        if let Some(px) = self.staged.get_mut(position) {
            *px = (r, g, b);
        }
    }

    fn commit(&mut self) {
        self.frames.push(self.staged.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    Tone { frequency_hz: u32, volume: u8 },
    Silence,
}

#[derive(Default)]
pub struct MockAudio {
    pub calls: Vec<AudioCall>,
}

impl AudioPort for MockAudio {
    fn tone(&mut self, frequency_hz: u32, volume: u8) {
        self.calls.push(AudioCall::Tone {
            frequency_hz,
            volume,
        });
    }

    fn silence(&mut self) {
        self.calls.push(AudioCall::Silence);
    }
}
