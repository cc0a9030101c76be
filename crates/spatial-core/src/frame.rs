#![forbid(unsafe_code)]

//! Frame clock and poll bookkeeping shared by both subsystems.
//!
//! The engine has no timers. Every subsystem is handed a [`Frame`] once per
//! tick and compares the frame index against the last frame in which a
//! record was polled ([`PollStamp`]). A record that misses `grace` consecutive
//! frames is considered abandoned.

use web_time::{Duration, Instant};

/// One tick of the external fixed-rate driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Monotonic frame counter.
    pub index: u64,
    /// Wall-clock time at the start of this frame.
    pub now: Instant,
    /// Time elapsed since the previous frame.
    pub delta: Duration,
}

impl Frame {
    /// The first frame of a session.
    #[must_use]
    pub fn first(now: Instant) -> Self {
        Self {
            index: 0,
            now,
            delta: Duration::ZERO,
        }
    }

    /// The frame following `self`, `delta` later.
    #[must_use]
    pub fn next(self, delta: Duration) -> Self {
        Self {
            index: self.index + 1,
            now: self.now + delta,
            delta,
        }
    }
}

/// Last frame in which a record was polled by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollStamp {
    last_polled: u64,
}

impl PollStamp {
    #[must_use]
    pub const fn new(frame: u64) -> Self {
        Self { last_polled: frame }
    }

    pub fn mark(&mut self, frame: u64) {
        self.last_polled = self.last_polled.max(frame);
    }

    #[inline]
    #[must_use]
    pub const fn last_polled(&self) -> u64 {
        self.last_polled
    }

    /// Polled in this frame or within the previous `grace - 1` frames.
    #[inline]
    #[must_use]
    pub const fn is_live(&self, frame: u64, grace: u64) -> bool {
        frame.saturating_sub(self.last_polled) < grace
    }
}
