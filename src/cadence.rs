//! Cadence gate: decides whether a tick is due to render.
//!
//! The timer that ticks a driver may fire faster than the animation should
//! play. The gate remembers when the last frame was rendered and only lets
//! a tick through once the interval has elapsed.

use std::time::{Duration, Instant};

/// Tracks the last render time against a fixed interval.
///
/// ## Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use keyframe_player::CadenceGate;
///
/// let start = Instant::now();
/// let mut gate = CadenceGate::starting_at(Duration::from_millis(200), start);
///
/// assert!(!gate.should_advance_at(start + Duration::from_millis(100)));
/// assert!(gate.should_advance_at(start + Duration::from_millis(200)));
///
/// // Nothing changes until the caller marks the render.
/// gate.mark_rendered_at(start + Duration::from_millis(200));
/// assert!(!gate.should_advance_at(start + Duration::from_millis(300)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CadenceGate {
    interval: Duration,
    last_render: Instant,
}

impl CadenceGate {
    /// Create a gate whose first frame is due one interval from now.
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    /// Create a gate as if a frame had been rendered at `last_render`.
    pub fn starting_at(interval: Duration, last_render: Instant) -> Self {
        Self {
            interval,
            last_render,
        }
    }

    /// Minimum time between two renders.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the last frame was rendered (or the gate was created).
    #[inline]
    pub fn last_render(&self) -> Instant {
        self.last_render
    }

    /// Check whether at least one interval passed since the last render.
    ///
    /// Has no side effect: repeated calls keep answering against the same
    /// timestamp until [`mark_rendered`](Self::mark_rendered) is called.
    #[inline]
    pub fn should_advance(&self) -> bool {
        self.should_advance_at(Instant::now())
    }

    /// Same as [`should_advance`](Self::should_advance) with an explicit clock reading.
    pub fn should_advance_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_render) >= self.interval
    }

    /// Record a render happening now.
    #[inline]
    pub fn mark_rendered(&mut self) {
        self.mark_rendered_at(Instant::now());
    }

    /// Record a render at `now`. Earlier instants are ignored.
    pub fn mark_rendered_at(&mut self, now: Instant) {
        self.last_render = self.last_render.max(now);
    }

    /// Time left before the next frame is due.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.saturating_duration_since(self.last_render))
    }
}
