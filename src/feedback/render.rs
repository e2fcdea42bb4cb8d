//! Frame renderer for the pixel ring.
//!
//! Pure function of [`FeedbackState`]: the same state always yields the
//! same frame, so animations are testable without a strip attached.
//!
//! | Mode          | Output                                            |
//! |---------------|---------------------------------------------------|
//! | ApprovalFlash | whole ring, approval colour                       |
//! | DenialFlash   | whole ring, denial colour                         |
//! | Loading       | 4-pixel comet (1, 1/2, 1/4, 1/8) rotating         |
//! | Waiting       | whole ring, sinusoidal breathing of waiting colour |

use core::f32::consts::TAU;

use super::state::{FeedbackState, Mode};
use crate::config::ReaderConfig;

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

/// Largest ring the frame buffer holds.
pub const MAX_RING_LEN: usize = 64;

/// One frame, one colour per ring position.
pub type Frame = heapless::Vec<Rgb, MAX_RING_LEN>;

pub const OFF: Rgb = (0, 0, 0);

const BLANK: [Rgb; MAX_RING_LEN] = [OFF; MAX_RING_LEN];

/// Comet trail brightness, head first.
const COMET: [u8; 4] = [255, 127, 63, 31];

/// Everything the renderer needs besides the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub ring_len: usize,
    pub tick_interval_ms: u32,
    pub breathing_period_ms: u32,
    pub approval: Rgb,
    pub denial: Rgb,
    pub waiting: Rgb,
    pub loading: Rgb,
}

impl From<&ReaderConfig> for RenderConfig {
    fn from(c: &ReaderConfig) -> Self {
        Self {
            ring_len: c.ring_len,
            tick_interval_ms: c.frame_interval_ms,
            breathing_period_ms: c.breathing_period_ms,
            approval: c.approval_colour,
            denial: c.denial_colour,
            waiting: c.waiting_colour,
            loading: c.loading_colour,
        }
    }
}

pub fn render(state: &FeedbackState, cfg: &RenderConfig) -> Frame {
    let len = cfg.ring_len.min(MAX_RING_LEN);
    let mut frame = Frame::from_slice(&BLANK[..len]).unwrap_or_default();
    if len == 0 {
        return frame;
    }

    match state.mode {
        Mode::ApprovalFlash(_) => frame.fill(cfg.approval),
        Mode::DenialFlash(_) => frame.fill(cfg.denial),
        Mode::Waiting => {
            let level = breathing_level(state.tick_counter, cfg.tick_interval_ms, cfg.breathing_period_ms);
            frame.fill(scale(cfg.waiting, level));
        }
        Mode::Loading => {
            let head = state.cursor as usize % len;
            // Tail first so the head wins on rings shorter than the comet.
            for (k, &level) in COMET.iter().enumerate().rev() {
                let pos = (head + len * COMET.len() - k) % len;
                frame[pos] = scale(cfg.loading, level);
            }
        }
    }
    frame
}

/// `sin(2π·t/period)·127 + 127` with `t` in milliseconds, so the pulse
/// keeps its period whatever the frame rate.
pub fn breathing_level(tick_counter: u32, tick_interval_ms: u32, period_ms: u32) -> u8 {
    let period = u64::from(period_ms.max(1));
    let elapsed = u64::from(tick_counter) * u64::from(tick_interval_ms) % period;
    let phase = elapsed as f32 / period as f32;
    ((phase * TAU).sin() * 127.0 + 127.0).round().clamp(0.0, 255.0) as u8
}

pub fn scale(colour: Rgb, brightness: u8) -> Rgb {
    let (r, g, b) = colour;
    let br = brightness as u16;
    (
        ((r as u16 * br) / 255) as u8,
        ((g as u16 * br) / 255) as u8,
        ((b as u16 * br) / 255) as u8,
    )
}
