//! TagScanner driving a real DurableQueue through mock reader/clock/sinks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tagreader::access::Whitelist;
use tagreader::adapters::fs::MemFs;
use tagreader::app::events::ScanEvent;
use tagreader::app::ports::{EventLog, StorageError};
use tagreader::config::ReaderConfig;
use tagreader::feedback::{BaseMode, FeedbackController, FeedbackHandle, Mode};
use tagreader::queue::DurableQueue;
use tagreader::scanner::{Connection, ScannerConfig, StepOutcome, TagScanner};
use tagreader::{QueueError, TagId};

use crate::mock_hw::{
    FaultyFs, FeedbackCall, FixedClock, MockAudio, MockDelay, MockLight, MockReader, Poll,
    RecordingFeedback, RecordingSink,
};

const PATH: &str = "/outbox.txt";
const A: [u8; 4] = [0xDE, 0xAD, 0xBE, 0xEF];
const B: [u8; 7] = [0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

fn config() -> ScannerConfig {
    ScannerConfig {
        read_timeout: Duration::from_millis(100),
        failure_threshold: 5,
        cooldown_ms: 5000,
        flash_duration_ms: 700,
    }
}

fn allow_all(_: &TagId) -> bool {
    true
}

struct Rig<L: EventLog> {
    scanner: TagScanner<MockReader, L, fn(&TagId) -> bool>,
    delay: MockDelay,
    clock: FixedClock,
    feedback: RecordingFeedback,
    sink: RecordingSink,
}

impl<L: EventLog> Rig<L> {
    fn new(reader: MockReader, log: L) -> Self {
        Self {
            scanner: TagScanner::new(reader, log, allow_all as fn(&TagId) -> bool, config()),
            delay: MockDelay::default(),
            clock: FixedClock::at(1_000),
            feedback: RecordingFeedback::default(),
            sink: RecordingSink::default(),
        }
    }

    fn step(&mut self) -> StepOutcome {
        self.clock.advance(10);
        self.scanner
            .step(&mut self.delay, &self.clock, &self.feedback, &mut self.sink)
    }

    fn run(&mut self, n: usize) -> Vec<StepOutcome> {
        (0..n).map(|_| self.step()).collect()
    }
}

fn queue_rig(script: impl IntoIterator<Item = Poll>) -> Rig<DurableQueue<MemFs>> {
    Rig::new(MockReader::new(script), DurableQueue::open(MemFs::new(), PATH))
}

fn recorded(rig: &Rig<DurableQueue<MemFs>>) -> usize {
    rig.scanner.event_log().len().unwrap()
}

// ── Dedupe ────────────────────────────────────────────────────

#[test]
fn held_tag_is_recorded_once() {
    let mut rig = queue_rig([Poll::Tag(A.to_vec()), Poll::Tag(A.to_vec()), Poll::Tag(A.to_vec())]);
    let outcomes = rig.run(4); // connect + 3 polls

    assert_eq!(outcomes[0], StepOutcome::Reconnected);
    assert!(matches!(outcomes[1], StepOutcome::Detected { stored: true, .. }));
    assert_eq!(outcomes[2], StepOutcome::Duplicate);
    assert_eq!(outcomes[3], StepOutcome::Duplicate);
    assert_eq!(recorded(&rig), 1);
    assert_eq!(rig.feedback.flashes(), vec![FeedbackCall::Approve(700)]);
}

#[test]
fn lifted_and_presented_again_is_recorded_twice() {
    let mut rig = queue_rig([Poll::Tag(A.to_vec()), Poll::Empty, Poll::Tag(A.to_vec())]);
    rig.run(4);
    assert_eq!(recorded(&rig), 2);
    assert_eq!(rig.feedback.flashes().len(), 2);
}

#[test]
fn switching_tags_records_each() {
    let mut rig = queue_rig([Poll::Tag(A.to_vec()), Poll::Tag(B.to_vec()), Poll::Tag(A.to_vec())]);
    rig.run(4);
    assert_eq!(recorded(&rig), 3);

    let head = rig.scanner.event_log().peek().unwrap().unwrap();
    assert_eq!(head.line(), "UID:DEADBEEF,Time:1020");
}

#[test]
fn detection_time_comes_from_the_clock() {
    let mut rig = queue_rig([Poll::Tag(B.to_vec())]);
    rig.run(2);
    assert_eq!(
        rig.sink.events.last(),
        Some(&ScanEvent::TagRecorded {
            tag: TagId::from_bytes(&B).unwrap(),
            detected_at: 1_020,
            authorized: true,
        })
    );
}

#[test]
fn reader_fault_keeps_dedupe_memory() {
    let mut rig = queue_rig([Poll::Tag(A.to_vec()), Poll::Fault, Poll::Tag(A.to_vec())]);
    let outcomes = rig.run(5); // connect, A, fault, reconnect, A

    assert_eq!(outcomes[2], StepOutcome::ReaderLost);
    assert_eq!(outcomes[3], StepOutcome::Reconnected);
    assert_eq!(outcomes[4], StepOutcome::Duplicate);
    assert_eq!(recorded(&rig), 1);
}

#[test]
fn malformed_ids_are_reported_and_ignored() {
    let mut rig = queue_rig([Poll::Tag(vec![1, 2, 3]), Poll::Tag(vec![0; 12])]);
    let outcomes = rig.run(3);

    assert_eq!(outcomes[1], StepOutcome::Malformed);
    assert_eq!(outcomes[2], StepOutcome::Malformed);
    assert_eq!(recorded(&rig), 0);
    assert!(rig.sink.events.contains(&ScanEvent::MalformedTag { len: 3 }));
    assert!(rig.sink.events.contains(&ScanEvent::MalformedTag { len: 12 }));
}

#[test]
fn poll_uses_configured_timeout() {
    let mut rig = queue_rig(Vec::<Poll>::new());
    rig.run(3);
    assert!(
        rig.scanner
            .reader()
            .timeouts
            .iter()
            .all(|t| *t == Duration::from_millis(100))
    );
}

// ── Reconnect and backoff ─────────────────────────────────────

#[test]
fn seventh_failure_in_a_row_is_preceded_by_cooldown() {
    let mut rig = queue_rig(Vec::<Poll>::new());
    rig.scanner.reader_mut().reconnect_ok = false;

    let outcomes = rig.run(6);
    for (i, o) in outcomes.iter().enumerate() {
        assert_eq!(
            *o,
            StepOutcome::ReconnectFailed {
                failures: i as u32 + 1,
                cooled_down: false
            }
        );
    }
    assert!(rig.delay.pauses_ms.is_empty());

    assert_eq!(
        rig.step(),
        StepOutcome::ReconnectFailed {
            failures: 7,
            cooled_down: true
        }
    );
    assert_eq!(rig.delay.pauses_ms, vec![5000]);
    assert_eq!(rig.scanner.state().connection, Connection::Disconnected);
}

#[test]
fn scanner_keeps_retrying_and_recovers() {
    let mut rig = queue_rig([Poll::Tag(A.to_vec())]);
    rig.scanner.reader_mut().reconnect_ok = false;
    rig.run(20);
    assert_eq!(rig.scanner.state().consecutive_failures, 20);
    assert_eq!(rig.delay.pauses_ms.len(), 14);
    assert_eq!(rig.feedback.last_base(), Some(BaseMode::Loading));

    rig.scanner.reader_mut().reconnect_ok = true;
    assert_eq!(rig.step(), StepOutcome::Reconnected);
    assert_eq!(rig.scanner.state().consecutive_failures, 0);
    assert_eq!(rig.feedback.last_base(), Some(BaseMode::Waiting));
    assert!(matches!(rig.step(), StepOutcome::Detected { .. }));
}

#[test]
fn fault_counts_toward_the_streak() {
    let mut rig = queue_rig([Poll::Fault]);
    rig.run(2);
    assert_eq!(rig.scanner.state().consecutive_failures, 1);
    assert_eq!(rig.sink.events.last(), Some(&ScanEvent::ReaderLost));
}

// ── Storage failure ───────────────────────────────────────────

#[test]
fn storage_failure_still_gives_feedback_and_keeps_scanning() {
    let mut fs = FaultyFs::new();
    fs.offline = true;
    let mut rig = Rig::new(
        MockReader::new([Poll::Tag(A.to_vec()), Poll::Empty, Poll::Tag(B.to_vec())]),
        DurableQueue::open(fs, PATH),
    );
    let outcomes = rig.run(4);

    assert!(matches!(outcomes[1], StepOutcome::Detected { stored: false, .. }));
    assert!(matches!(outcomes[3], StepOutcome::Detected { stored: false, .. }));
    assert_eq!(rig.feedback.flashes().len(), 2);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        ScanEvent::StorageFailed {
            error: QueueError::StorageUnavailable(StorageError::Unavailable),
            ..
        }
    )));
}

#[test]
fn shared_queue_is_visible_to_the_uploader() {
    let outbox = Arc::new(Mutex::new(DurableQueue::open(MemFs::new(), PATH)));
    let mut rig = Rig::new(MockReader::new([Poll::Tag(A.to_vec())]), outbox.clone());
    rig.run(2);

    let mut q = outbox.lock().unwrap();
    let head = q.peek().unwrap().unwrap();
    q.dequeue(&head).unwrap();
    assert!(q.is_empty().unwrap());
}

// ── Access policy ─────────────────────────────────────────────

#[test]
fn enforced_whitelist_denies_unknown_tags() {
    let whitelist = Whitelist::from_entries(&["222-173-190-239"], true);
    let mut scanner = TagScanner::new(
        MockReader::new([Poll::Tag(A.to_vec()), Poll::Empty, Poll::Tag(B.to_vec())]),
        DurableQueue::open(MemFs::new(), PATH),
        whitelist,
        config(),
    );
    let (mut delay, clock, feedback, mut sink) = (
        MockDelay::default(),
        FixedClock::at(0),
        RecordingFeedback::default(),
        RecordingSink::default(),
    );
    for _ in 0..4 {
        scanner.step(&mut delay, &clock, &feedback, &mut sink);
    }

    assert_eq!(
        feedback.flashes(),
        vec![FeedbackCall::Approve(700), FeedbackCall::Deny(700)]
    );
    assert_eq!(scanner.event_log().len().unwrap(), 2, "denied tags are still recorded");
}

// ── Scanner → handle → controller ─────────────────────────────

#[test]
fn detection_reaches_the_ring_on_the_next_frame() {
    let cfg = ReaderConfig::default();
    let handle = FeedbackHandle::new();
    let mut controller = FeedbackController::new(MockLight::new(cfg.ring_len), MockAudio::default(), &cfg);
    let mut scanner = TagScanner::new(
        MockReader::new([Poll::Tag(A.to_vec())]),
        DurableQueue::open(MemFs::new(), PATH),
        allow_all as fn(&TagId) -> bool,
        ScannerConfig::from(&cfg),
    );
    let (mut delay, clock, mut sink) = (MockDelay::default(), FixedClock::at(0), RecordingSink::default());

    scanner.step(&mut delay, &clock, &handle, &mut sink);
    controller.sync(&handle);
    controller.tick();
    assert_eq!(controller.state().mode, Mode::Waiting);

    scanner.step(&mut delay, &clock, &handle, &mut sink);
    controller.sync(&handle);
    controller.tick();
    assert!(matches!(controller.state().mode, Mode::ApprovalFlash(_)));
    assert!(controller.light().last_frame().iter().all(|&px| px == cfg.approval_colour));
}
