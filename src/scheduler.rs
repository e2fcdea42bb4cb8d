//! Periodic task loops.
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │ scan task (scan_interval)    │   │ render task (frame_interval) │
//! │                              │   │                              │
//! │  TagScanner::step ──────────────▶│  FeedbackController::sync    │
//! │   (FeedbackHandle)           │   │  FeedbackController::tick    │
//! │  Ticker::next().await        │   │  Ticker::next().await        │
//! └──────────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! Both loops run forever.  Timing is deadline-based: a late frame does not
//! push every later frame back, and a stall longer than one interval skips
//! the missed ticks instead of bursting to catch up.

use core::time::Duration;
use std::time::Instant;

use embedded_hal::delay::DelayNs;
use log::info;

use crate::app::ports::{
    AccessPolicy, AudioPort, Clock, EventLog, EventSink, FeedbackPort, LightPort, ReaderPort,
};
use crate::feedback::{FeedbackController, FeedbackHandle};
use crate::scanner::TagScanner;

/// Fixed-interval tick source on the `async-io-mini` reactor.
pub struct Ticker {
    interval: Duration,
    deadline: Instant,
}

impl Ticker {
    /// First tick fires one `interval` from now.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            deadline: Instant::now() + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next deadline.
    pub async fn next(&mut self) {
        let now = Instant::now();
        if self.deadline > now {
            async_io_mini::Timer::after(self.deadline - now).await;
        }
        self.deadline = next_deadline(self.deadline, Instant::now(), self.interval);
    }
}

/// Following deadline after `deadline` fired at `now`.
fn next_deadline(deadline: Instant, now: Instant, interval: Duration) -> Instant {
    let next = deadline + interval;
    if next <= now { now + interval } else { next }
}

/// Drive `scanner` every `interval`, forever.
pub async fn run_scan_loop<R, L, P, D, C, F, S>(
    scanner: &mut TagScanner<R, L, P>,
    delay: &mut D,
    clock: &C,
    feedback: &F,
    sink: &mut S,
    interval: Duration,
) where
    R: ReaderPort,
    L: EventLog,
    P: AccessPolicy,
    D: DelayNs,
    C: Clock,
    F: FeedbackPort,
    S: EventSink,
{
    info!("Scan loop started ({}ms)", interval.as_millis());
    let mut ticker = Ticker::every(interval);
    loop {
        scanner.step(delay, clock, feedback, sink);
        ticker.next().await;
    }
}

/// Pull commands from `handle` and render one frame every `interval`, forever.
pub async fn run_render_loop<L: LightPort, A: AudioPort>(
    controller: &mut FeedbackController<L, A>,
    handle: &FeedbackHandle,
    interval: Duration,
) {
    info!("Render loop started ({}ms)", interval.as_millis());
    let mut ticker = Ticker::every(interval);
    loop {
        controller.sync(handle);
        controller.tick();
        ticker.next().await;
    }
}
