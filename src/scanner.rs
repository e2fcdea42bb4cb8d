//! Tag detection state machine: dedupe, reconnect and backoff.
//!
//! ```text
//!                 reconnect ok
//!  ┌──────────────┐ ─────────────▶ ┌───────────┐
//!  │ Disconnected │                │ Connected │──poll──▶ NoTag   → forget last tag
//!  │ (Loading)    │ ◀───────────── │ (Waiting) │        ▶ Tag(id) → new? record + flash
//!  └──────────────┘  reader fault  └───────────┘        ▶ Fault   → Disconnected
//!        │
//!        └─ failures > threshold: cooldown pause before each attempt
//! ```
//!
//! The scanner never gives up: however long the chip is missing it keeps
//! retrying, just more slowly.  Dedupe memory is one tag deep and cleared
//! only by an empty read, so a card held on the reader is recorded once
//! while a card lifted and presented again is recorded twice.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::events::ScanEvent;
use crate::app::ports::{
    AccessPolicy, Clock, EventLog, EventSink, FeedbackPort, RawTag, ReaderPort,
};
use crate::config::ReaderConfig;
use crate::feedback::BaseMode;
use crate::queue::record::TagId;

// ── State ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Disconnected,
    Connected,
}

/// In-memory scanner state.  Starts disconnected; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerState {
    pub connection: Connection,
    pub last_seen_tag: Option<TagId>,
    pub consecutive_failures: u32,
}

impl Default for ScannerState {
    fn default() -> Self {
        Self {
            connection: Connection::Disconnected,
            last_seen_tag: None,
            consecutive_failures: 0,
        }
    }
}

/// Result of one bounded read attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    NoTag,
    Tag(TagId),
    /// The reader answered with an id of an impossible length.
    Malformed(usize),
    ReaderFault,
}

/// What one [`TagScanner::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Reconnected,
    ReconnectFailed { failures: u32, cooled_down: bool },
    ReaderLost,
    NoTag,
    Duplicate,
    Malformed,
    Detected { tag: TagId, authorized: bool, stored: bool },
}

/// Timing knobs, taken from [`ReaderConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerConfig {
    pub read_timeout: Duration,
    pub failure_threshold: u32,
    pub cooldown_ms: u32,
    pub flash_duration_ms: u32,
}

impl From<&ReaderConfig> for ScannerConfig {
    fn from(c: &ReaderConfig) -> Self {
        Self {
            read_timeout: Duration::from_millis(u64::from(c.read_timeout_ms)),
            failure_threshold: c.failure_threshold,
            cooldown_ms: c.cooldown_ms,
            flash_duration_ms: c.flash_duration_ms,
        }
    }
}

// ── Scanner ───────────────────────────────────────────────────

/// Owns the reader, its state and a write-only handle on the outbox.
pub struct TagScanner<R: ReaderPort, L: EventLog, P: AccessPolicy> {
    reader: R,
    log: L,
    policy: P,
    config: ScannerConfig,
    state: ScannerState,
}

impl<R: ReaderPort, L: EventLog, P: AccessPolicy> TagScanner<R, L, P> {
    pub fn new(reader: R, log: L, policy: P, config: ScannerConfig) -> Self {
        Self {
            reader,
            log,
            policy,
            config,
            state: ScannerState::default(),
        }
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn event_log(&self) -> &L {
        &self.log
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// One bounded read attempt.
    pub fn poll(&mut self) -> PollOutcome {
        match self.reader.poll(self.config.read_timeout) {
            Some(raw) => classify(&raw),
            None if self.reader.firmware_present() => PollOutcome::NoTag,
            None => PollOutcome::ReaderFault,
        }
    }

    /// One scan cycle.  Never fails; every problem is absorbed into the
    /// reconnect policy or reported through `sink`.
    pub fn step<D, C, F, S>(
        &mut self,
        delay: &mut D,
        clock: &C,
        feedback: &F,
        sink: &mut S,
    ) -> StepOutcome
    where
        D: DelayNs,
        C: Clock,
        F: FeedbackPort,
        S: EventSink,
    {
        match self.state.connection {
            Connection::Disconnected => self.try_reconnect(delay, feedback, sink),
            Connection::Connected => self.scan(clock, feedback, sink),
        }
    }

    fn try_reconnect<D: DelayNs, F: FeedbackPort, S: EventSink>(
        &mut self,
        delay: &mut D,
        feedback: &F,
        sink: &mut S,
    ) -> StepOutcome {
        let cooled_down = self.state.consecutive_failures > self.config.failure_threshold;
        if cooled_down {
            warn!(
                "Scanner: {} consecutive failures, cooling down {}ms",
                self.state.consecutive_failures, self.config.cooldown_ms
            );
            delay.delay_ms(self.config.cooldown_ms);
        }

        if self.reader.reconnect() && self.reader.firmware_present() {
            info!(
                "Scanner: reader connected after {} failures",
                self.state.consecutive_failures
            );
            self.state.consecutive_failures = 0;
            self.state.connection = Connection::Connected;
            feedback.set_base(BaseMode::Waiting);
            sink.emit(&ScanEvent::ReaderConnected);
            return StepOutcome::Reconnected;
        }

        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
        let failures = self.state.consecutive_failures;
        feedback.set_base(BaseMode::Loading);
        sink.emit(&ScanEvent::ReconnectFailed {
            failures,
            cooled_down,
        });
        StepOutcome::ReconnectFailed {
            failures,
            cooled_down,
        }
    }

    fn scan<C: Clock, F: FeedbackPort, S: EventSink>(
        &mut self,
        clock: &C,
        feedback: &F,
        sink: &mut S,
    ) -> StepOutcome {
        match self.poll() {
            PollOutcome::ReaderFault => {
                warn!("Scanner: reader stopped responding");
                self.state.connection = Connection::Disconnected;
                self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
                feedback.set_base(BaseMode::Loading);
                sink.emit(&ScanEvent::ReaderLost);
                StepOutcome::ReaderLost
            }
            PollOutcome::NoTag => {
                self.state.last_seen_tag = None;
                StepOutcome::NoTag
            }
            PollOutcome::Malformed(len) => {
                warn!("Scanner: ignoring {}-byte tag id", len);
                sink.emit(&ScanEvent::MalformedTag { len });
                StepOutcome::Malformed
            }
            PollOutcome::Tag(tag) if self.state.last_seen_tag.as_ref() == Some(&tag) => {
                StepOutcome::Duplicate
            }
            PollOutcome::Tag(tag) => self.detected(tag, clock, feedback, sink),
        }
    }

    fn detected<C: Clock, F: FeedbackPort, S: EventSink>(
        &mut self,
        tag: TagId,
        clock: &C,
        feedback: &F,
        sink: &mut S,
    ) -> StepOutcome {
        self.state.last_seen_tag = Some(tag.clone());
        let detected_at = clock.now_ms();
        let authorized = self.policy.is_authorized(&tag);

        let stored = match self.log.record(&tag, detected_at) {
            Ok(()) => {
                info!(
                    "Scanner: tag {} at {}ms ({})",
                    tag,
                    detected_at,
                    if authorized { "approved" } else { "denied" }
                );
                sink.emit(&ScanEvent::TagRecorded {
                    tag: tag.clone(),
                    detected_at,
                    authorized,
                });
                true
            }
            Err(error) => {
                warn!("Scanner: tag {} not stored: {}", tag, error);
                sink.emit(&ScanEvent::StorageFailed {
                    tag: tag.clone(),
                    error,
                });
                false
            }
        };

        if authorized {
            feedback.approve(self.config.flash_duration_ms);
        } else {
            feedback.deny(self.config.flash_duration_ms);
        }

        StepOutcome::Detected {
            tag,
            authorized,
            stored,
        }
    }
}

fn classify(raw: &RawTag) -> PollOutcome {
    match TagId::from_bytes(raw) {
        Ok(tag) if tag.is_reader_length() => PollOutcome::Tag(tag),
        _ => PollOutcome::Malformed(raw.len()),
    }
}
