//! Frame Clock
//!
//! Source of the per-frame delta time fed into the systems. The wall clock
//! is read exactly once per frame, in [`FrameClock::advance`]; total
//! elapsed time is derived from the two stored instants rather than
//! accumulated, so the clock cannot drift from its own bookkeeping.

use std::time::{Duration, Instant};

/// Upper bound on the delta handed to systems, in seconds.
///
/// After a stall (debugger break, window drag, suspended host) simulation
/// resumes with one bounded step instead of integrating the whole gap.
pub const MAX_DELTA_SECONDS: f32 = 0.25;

/// Per-frame time source.
pub struct FrameClock {
    origin: Instant,
    frame_start: Instant,
    raw_delta: Duration,
    frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            origin: now,
            frame_start: now,
            raw_delta: Duration::ZERO,
            frames: 0,
        }
    }

    /// Begins the next frame and returns its delta, clamped to
    /// [`MAX_DELTA_SECONDS`].
    pub fn advance(&mut self) -> f32 {
        let now = Instant::now();
        self.raw_delta = now - self.frame_start;
        self.frame_start = now;
        self.frames += 1;
        self.delta_seconds()
    }

    /// Clamped delta of the current frame, in seconds.
    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.raw_delta.as_secs_f32().min(MAX_DELTA_SECONDS)
    }

    /// Unclamped delta of the current frame, for diagnostics.
    #[must_use]
    pub fn raw_delta(&self) -> Duration {
        self.raw_delta
    }

    /// Wall time between clock creation and the current frame's start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.frame_start - self.origin
    }

    /// Number of completed [`FrameClock::advance`] calls.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_counts_frames_and_bounds_delta() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.frame_index(), 0);

        let dt = clock.advance();
        assert_eq!(clock.frame_index(), 1);
        assert!(dt >= 0.0);
        assert!(dt <= MAX_DELTA_SECONDS);
        assert!(clock.delta_seconds() <= MAX_DELTA_SECONDS);
    }
}
