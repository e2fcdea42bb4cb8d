//! Visual and audio feedback engine.
//!
//! ```text
//!  scan task                     render task (fixed frame interval)
//!  ─────────                     ──────────────────────────────────
//!  FeedbackHandle::approve ──▶ Signal ──▶ FeedbackController::sync
//!  FeedbackHandle::set_base ─▶ AtomicU8 ─┘        │
//!                                                 ▼
//!                                FeedbackController::tick
//!                                  ├─ state.transition(Tick)
//!                                  ├─ render(state) ─▶ LightPort
//!                                  └─ melody.tick   ─▶ AudioPort
//! ```
//!
//! Only the render task mutates [`FeedbackState`].  The scan task talks to
//! it through a [`FeedbackHandle`]: a single-slot, latest-command-wins
//! signal for flashes and an atomic for the base mode, so a command issued
//! during one frame is rendered on the next.

pub mod melody;
pub mod render;
pub mod state;

use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::debug;

use crate::app::ports::{AudioPort, FeedbackPort, LightPort};
use crate::config::ReaderConfig;
use melody::{MelodyPlayer, Note};
use render::{Frame, RenderConfig, render};
pub use state::{BaseMode, FeedbackEvent, FeedbackState, Mode, flash_ticks};

// ── Cross-task handoff ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Approval,
    Denial,
}

/// A flash request in milliseconds; converted to ticks by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashCommand {
    pub kind: FlashKind,
    pub duration_ms: u32,
}

/// Command mailbox shared by the scan and render tasks.
///
/// `const`-constructible so it can live in a `static`.
pub struct FeedbackHandle {
    flash: Signal<CriticalSectionRawMutex, FlashCommand>,
    base: AtomicU8,
}

impl Default for FeedbackHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackHandle {
    pub const fn new() -> Self {
        Self {
            flash: Signal::new(),
            base: AtomicU8::new(BaseMode::Waiting as u8),
        }
    }

    /// Take the pending flash command, if any.
    pub fn take_flash(&self) -> Option<FlashCommand> {
        self.flash.try_take()
    }

    pub fn base(&self) -> BaseMode {
        BaseMode::from_u8(self.base.load(Ordering::Acquire))
    }
}

impl FeedbackPort for FeedbackHandle {
    fn approve(&self, duration_ms: u32) {
        self.flash.signal(FlashCommand {
            kind: FlashKind::Approval,
            duration_ms,
        });
    }

    fn deny(&self, duration_ms: u32) {
        self.flash.signal(FlashCommand {
            kind: FlashKind::Denial,
            duration_ms,
        });
    }

    fn set_base(&self, mode: BaseMode) {
        self.base.store(mode as u8, Ordering::Release);
    }
}

// ── Controller ───────────────────────────────────────────────

/// Owns the feedback state and the light/audio outputs.
pub struct FeedbackController<L: LightPort, A: AudioPort> {
    light: L,
    audio: A,
    state: FeedbackState,
    render: RenderConfig,
    approval_melody: Vec<Note>,
    denial_melody: Vec<Note>,
    player: MelodyPlayer,
}

impl<L: LightPort, A: AudioPort> FeedbackController<L, A> {
    pub fn new(light: L, audio: A, config: &ReaderConfig) -> Self {
        Self {
            light,
            audio,
            state: FeedbackState::default(),
            render: RenderConfig::from(config),
            approval_melody: config.approval_melody.clone(),
            denial_melody: config.denial_melody.clone(),
            player: MelodyPlayer::new(),
        }
    }

    pub fn state(&self) -> FeedbackState {
        self.state
    }

    pub fn tick_interval_ms(&self) -> u32 {
        self.render.tick_interval_ms
    }

    /// Flash the approval colour for `duration_ms` and play the approval melody.
    pub fn approve(&mut self, duration_ms: u32) {
        let ticks = flash_ticks(duration_ms, self.render.tick_interval_ms);
        self.state = self.state.transition(FeedbackEvent::Approve { ticks });
        self.player.start(&self.approval_melody);
    }

    /// Flash the denial colour for `duration_ms` and play the denial melody.
    pub fn deny(&mut self, duration_ms: u32) {
        let ticks = flash_ticks(duration_ms, self.render.tick_interval_ms);
        self.state = self.state.transition(FeedbackEvent::Deny { ticks });
        self.player.start(&self.denial_melody);
    }

    pub fn set_base(&mut self, mode: BaseMode) {
        if self.state.base != mode {
            debug!("Feedback: base {:?} -> {:?}", self.state.base, mode);
            self.state = self.state.transition(FeedbackEvent::SetBase(mode));
        }
    }

    /// Apply whatever the scan task posted since the last frame.
    pub fn sync(&mut self, handle: &FeedbackHandle) {
        self.set_base(handle.base());
        if let Some(cmd) = handle.take_flash() {
            match cmd.kind {
                FlashKind::Approval => self.approve(cmd.duration_ms),
                FlashKind::Denial => self.deny(cmd.duration_ms),
            }
        }
    }

    /// Advance one frame: transition, render, push to the ring, step audio.
    pub fn tick(&mut self) -> Frame {
        self.state = self.state.transition(FeedbackEvent::Tick);
        let frame = render(&self.state, &self.render);
        for (pos, &(r, g, b)) in frame.iter().enumerate() {
            self.light.set(pos, r, g, b);
        }
        self.light.commit();
        self.player.tick(&mut self.audio, self.render.tick_interval_ms);
        frame
    }

    pub fn light(&self) -> &L {
        &self.light
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }
}
