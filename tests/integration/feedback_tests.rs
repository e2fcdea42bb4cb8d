//! FeedbackController frame by frame: flash timing, base animations,
//! melodies, and the handoff from the scan task.

use smart_leds::{RGB8, SmartLedsWrite};
use tagreader::app::ports::FeedbackPort;
use tagreader::config::ReaderConfig;
use tagreader::drivers::buzzer::Buzzer;
use tagreader::drivers::pixel_ring::PixelRing;
use tagreader::feedback::melody::Note;
use tagreader::feedback::{BaseMode, FeedbackController, FeedbackHandle, Mode};

use crate::mock_hw::{AudioCall, MockAudio, MockLight};

const GREEN: (u8, u8, u8) = (0, 255, 0);
const RED: (u8, u8, u8) = (255, 0, 0);

fn controller(cfg: &ReaderConfig) -> FeedbackController<MockLight, MockAudio> {
    FeedbackController::new(MockLight::new(cfg.ring_len), MockAudio::default(), cfg)
}

fn lit(frame: &[(u8, u8, u8)]) -> usize {
    frame.iter().filter(|&&px| px != (0, 0, 0)).count()
}

// ── Flash timing ──────────────────────────────────────────────

#[test]
fn approve_500ms_at_16ms_shows_exactly_32_flash_frames() {
    let cfg = ReaderConfig::default();
    assert_eq!(cfg.frame_interval_ms, 16);
    let mut c = controller(&cfg);

    c.approve(500);
    for frame in 1..=32 {
        c.tick();
        assert!(
            c.light().last_frame().iter().all(|&px| px == GREEN),
            "frame {frame} should be a flash frame"
        );
    }
    c.tick();
    assert_eq!(c.state().mode, Mode::Waiting);
    assert!(c.light().last_frame().iter().all(|&px| px != GREEN));
}

#[test]
fn flash_resumes_loading_with_the_comet() {
    let cfg = ReaderConfig::default();
    let mut c = controller(&cfg);
    c.set_base(BaseMode::Loading);
    c.tick();
    assert_eq!(lit(c.light().last_frame()), 4);

    c.deny(100); // 7 ticks
    for _ in 0..7 {
        c.tick();
        assert!(c.light().last_frame().iter().all(|&px| px == RED));
    }
    c.tick();
    assert_eq!(c.state().mode, Mode::Loading);
    assert_eq!(lit(c.light().last_frame()), 4);
}

#[test]
fn base_change_during_flash_waits_for_flash_to_end() {
    let cfg = ReaderConfig::default();
    let mut c = controller(&cfg);
    c.approve(48); // 3 ticks
    c.tick();
    c.set_base(BaseMode::Loading);
    assert!(matches!(c.state().mode, Mode::ApprovalFlash(_)));

    for _ in 0..3 {
        c.tick();
    }
    assert_eq!(c.state().mode, Mode::Loading);
}

#[test]
fn waiting_pulse_breathes_through_full_range() {
    let cfg = ReaderConfig::default();
    let mut c = controller(&cfg);
    let period_ticks = (cfg.breathing_period_ms / cfg.frame_interval_ms) as usize;

    let mut blues = Vec::new();
    for _ in 0..period_ticks {
        c.tick();
        let frame = c.light().last_frame();
        assert!(frame.windows(2).all(|w| w[0] == w[1]), "every pixel breathes together");
        assert_eq!((frame[0].0, frame[0].1), (0, 0));
        blues.push(frame[0].2);
    }
    assert!(*blues.iter().max().unwrap() >= 250);
    assert!(*blues.iter().min().unwrap() <= 5);
}

// ── Melodies ──────────────────────────────────────────────────

#[test]
fn approval_melody_plays_without_blocking_frames() {
    let cfg = ReaderConfig::default();
    let mut c = controller(&cfg);
    c.approve(cfg.flash_duration_ms);

    c.tick();
    assert_eq!(
        c.audio().calls,
        vec![AudioCall::Tone { frequency_hz: 700, volume: 200 }]
    );

    for _ in 0..14 {
        c.tick();
    }
    assert_eq!(
        c.audio().calls,
        vec![
            AudioCall::Tone { frequency_hz: 700, volume: 200 },
            AudioCall::Tone { frequency_hz: 880, volume: 200 },
            AudioCall::Silence,
        ]
    );
    assert!(matches!(c.state().mode, Mode::ApprovalFlash(_)), "flash outlasts the jingle");
}

#[test]
fn new_flash_restarts_the_melody() {
    let cfg = ReaderConfig::default();
    let mut c = controller(&cfg);
    c.approve(700);
    c.tick();
    c.tick();
    c.deny(700);
    c.tick();
    assert_eq!(
        c.audio().calls.last(),
        Some(&AudioCall::Tone { frequency_hz: 430, volume: 200 })
    );
}

#[test]
fn rests_silence_the_buzzer() {
    let cfg = ReaderConfig {
        approval_melody: vec![Note::new(1000, 16, 100), Note::rest(16), Note::new(1000, 16, 100)],
        ..ReaderConfig::default()
    };
    let mut c = controller(&cfg);
    c.approve(100);
    for _ in 0..4 {
        c.tick();
    }
    assert_eq!(
        c.audio().calls,
        vec![
            AudioCall::Tone { frequency_hz: 1000, volume: 100 },
            AudioCall::Silence,
            AudioCall::Tone { frequency_hz: 1000, volume: 100 },
            AudioCall::Silence,
        ]
    );
}

// ── Handoff from the scan task ────────────────────────────────

#[test]
fn latest_command_wins_within_a_frame() {
    let cfg = ReaderConfig::default();
    let handle = FeedbackHandle::new();
    let mut c = controller(&cfg);

    handle.approve(700);
    handle.deny(700);
    c.sync(&handle);
    c.tick();
    assert!(matches!(c.state().mode, Mode::DenialFlash(_)));

    // Consumed: the next frame sees nothing new.
    c.sync(&handle);
    c.tick();
    assert_eq!(
        c.audio().calls.iter().filter(|a| matches!(a, AudioCall::Tone { .. })).count(),
        1
    );
}

#[test]
fn handle_base_mode_applies_on_sync() {
    let cfg = ReaderConfig::default();
    let handle = FeedbackHandle::new();
    let mut c = controller(&cfg);

    handle.set_base(BaseMode::Loading);
    c.sync(&handle);
    c.tick();
    assert_eq!(c.state().mode, Mode::Loading);
}

// ── Real drivers on the host ──────────────────────────────────

#[derive(Default)]
struct Strip {
    last: Vec<RGB8>,
}

impl SmartLedsWrite for Strip {
    type Error = ();
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.last = iterator.into_iter().map(Into::into).collect();
        Ok(())
    }
}

#[test]
fn pixel_ring_and_buzzer_follow_the_controller() {
    let cfg = ReaderConfig::default();
    let ring = PixelRing::new(Strip::default(), cfg.ring_len);
    let mut c = FeedbackController::new(ring, Buzzer::new(), &cfg);

    c.deny(cfg.flash_duration_ms);
    c.tick();
    let strip = &c.light().writer().last;
    assert_eq!(strip.len(), 24);
    assert!(strip.iter().all(|&px| px == RGB8::new(255, 0, 0)));
    assert_eq!(c.audio().sounding(), Some(430));

    for _ in 0..14 {
        c.tick();
    }
    assert_eq!(c.audio().sounding(), None);
}
