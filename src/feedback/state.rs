//! Feedback state machine: pure transitions, no I/O.
//!
//! ```text
//!            approve/deny (any state)
//!   ┌────────┐ ──────────────▶ ┌──────────────────┐
//!   │ Base   │                 │ Flash(remaining) │── tick: remaining - 1
//!   │Waiting │ ◀────────────── │ Approval/Denial  │
//!   │Loading │  tick at 0      └──────────────────┘
//!   └────────┘
//! ```
//!
//! The base mode is tracked separately from the displayed mode so a flash
//! never loses it.

/// Long-running animation shown when no flash is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BaseMode {
    /// Reader connected, idle: slow breathing pulse.
    Waiting = 0,
    /// Reader not connected: rotating comet.
    Loading = 1,
}

impl BaseMode {
    pub const fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Loading,
            _ => Self::Waiting,
        }
    }
}

/// What the ring is showing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Waiting,
    Loading,
    /// Solid approval colour for `remaining` more ticks.
    ApprovalFlash(u32),
    /// Solid denial colour for `remaining` more ticks.
    DenialFlash(u32),
}

impl From<BaseMode> for Mode {
    fn from(base: BaseMode) -> Self {
        match base {
            BaseMode::Waiting => Self::Waiting,
            BaseMode::Loading => Self::Loading,
        }
    }
}

/// Inputs to [`FeedbackState::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackEvent {
    /// Start an approval flash lasting `ticks` frames.
    Approve { ticks: u32 },
    /// Start a denial flash lasting `ticks` frames.
    Deny { ticks: u32 },
    /// Change the animation shown outside flashes.
    SetBase(BaseMode),
    /// One frame elapsed.
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackState {
    pub mode: Mode,
    pub base: BaseMode,
    /// Frames rendered since boot (wrapping).
    pub tick_counter: u32,
    /// Comet head for the loading animation, taken modulo ring length.
    pub cursor: u32,
}

impl Default for FeedbackState {
    fn default() -> Self {
        Self {
            mode: Mode::Waiting,
            base: BaseMode::Waiting,
            tick_counter: 0,
            cursor: 0,
        }
    }
}

impl FeedbackState {
    pub fn transition(self, event: FeedbackEvent) -> Self {
        let mut next = self;
        match event {
            FeedbackEvent::Approve { ticks } => next.mode = Mode::ApprovalFlash(ticks),
            FeedbackEvent::Deny { ticks } => next.mode = Mode::DenialFlash(ticks),
            FeedbackEvent::SetBase(base) => {
                next.base = base;
                if !next.is_flashing() {
                    next.mode = base.into();
                }
            }
            FeedbackEvent::Tick => {
                next.tick_counter = self.tick_counter.wrapping_add(1);
                next.mode = match self.mode {
                    Mode::ApprovalFlash(r) if r > 0 => Mode::ApprovalFlash(r - 1),
                    Mode::DenialFlash(r) if r > 0 => Mode::DenialFlash(r - 1),
                    _ => self.base.into(),
                };
                if next.mode == Mode::Loading && next.tick_counter % 2 == 0 {
                    next.cursor = self.cursor.wrapping_add(1);
                }
            }
        }
        next
    }

    pub fn is_flashing(&self) -> bool {
        matches!(self.mode, Mode::ApprovalFlash(_) | Mode::DenialFlash(_))
    }
}

/// Frames needed to cover `duration_ms`, rounding up.
pub fn flash_ticks(duration_ms: u32, tick_interval_ms: u32) -> u32 {
    duration_ms.div_ceil(tick_interval_ms.max(1))
}
