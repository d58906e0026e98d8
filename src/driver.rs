//! Playback driver: one animation, one recipient, ticked by a timer.
//!
//! On every tick the driver
//! 1. stops if the recipient went away or every frame was shown,
//! 2. waits if the cadence gate says the next frame is not due yet,
//! 3. otherwise renders the current frame, advances, and marks the gate.
//!
//! A failed render is logged and skipped; only unreachability or the end of
//! the sequence stops a driver.

use std::fmt::Display;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cadence::CadenceGate;
use crate::state::PlaybackState;
use crate::timer::RepeatingTask;
use crate::{Frame, Sequence};

/// Something frames are shown to.
pub trait Recipient {
    /// Polled once per tick; `false` stops the driver for good.
    fn is_reachable(&self) -> bool;
}

impl<T: Recipient + ?Sized> Recipient for &T {
    fn is_reachable(&self) -> bool {
        (**self).is_reachable()
    }
}

impl<T: Recipient + ?Sized> Recipient for Arc<T> {
    fn is_reachable(&self) -> bool {
        (**self).is_reachable()
    }
}

impl<T: Recipient + ?Sized> Recipient for Box<T> {
    fn is_reachable(&self) -> bool {
        (**self).is_reachable()
    }
}

impl Recipient for AtomicBool {
    fn is_reachable(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

/// Online flag shared between the host and its drivers.
///
/// ```rust
/// use keyframe_player::{Presence, Recipient};
///
/// let player = Presence::new();
/// let seen_by_driver = player.clone();
/// assert!(seen_by_driver.is_reachable());
///
/// player.disconnect();
/// assert!(!seen_by_driver.is_reachable());
/// ```
#[derive(Clone, Debug)]
pub struct Presence {
    online: Arc<AtomicBool>,
}

impl Default for Presence {
    fn default() -> Self {
        Self::new()
    }
}

impl Presence {
    /// A recipient that starts online.
    pub fn new() -> Self {
        Self {
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Mark the recipient gone. Every driver sharing this flag stops on
    /// its next tick.
    pub fn disconnect(&self) {
        self.online.store(false, Ordering::Release);
    }

    /// Check if [`disconnect`](Self::disconnect) has not been called yet.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }
}

impl Recipient for Presence {
    fn is_reachable(&self) -> bool {
        self.is_online()
    }
}

/// Presentation of one frame to one recipient.
pub trait Renderer<R: ?Sized> {
    type Error: Display;

    /// Show `frame` to `recipient`. `cadence` is how long it stays up
    /// before the next frame replaces it.
    fn render(&self, recipient: &R, frame: &Frame, cadence: Duration) -> Result<(), Self::Error>;
}

impl<R, F, E> Renderer<R> for F
where
    R: ?Sized,
    F: Fn(&R, &Frame, Duration) -> Result<(), E>,
    E: Display,
{
    type Error = E;

    fn render(&self, recipient: &R, frame: &Frame, cadence: Duration) -> Result<(), E> {
        self(recipient, frame, cadence)
    }
}

/// Why a driver stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Every frame was shown
    Finished,
    /// The recipient is gone
    Unreachable,
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Next frame is not due yet
    Waiting,
    /// Frame `index` was rendered
    Rendered { index: usize },
    /// Rendering frame `index` failed; playback moved on anyway
    RenderFailed { index: usize },
    /// The driver is done and must not be ticked again
    Stopped(StopReason),
}

impl Tick {
    /// Check if the driver is done.
    #[inline]
    pub fn is_stopped(self) -> bool {
        matches!(self, Tick::Stopped(_))
    }
}

/// Counters kept by a driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Ticks received, including waiting and stopping ones
    pub ticks: u64,
    /// Frames rendered successfully
    pub rendered: u64,
    /// Frames whose render returned an error
    pub failed: u64,
}

/// Drives one playback to one recipient.
pub struct Driver<R, F> {
    recipient: R,
    renderer: F,
    state: PlaybackState,
    gate: CadenceGate,
    span: tracing::Span,
    stats: DriverStats,
}

impl<R, F> Driver<R, F>
where
    R: Recipient,
    F: Renderer<R>,
{
    /// Create a driver whose first frame is due one `cadence` from now.
    pub fn new(recipient: R, sequence: Sequence, renderer: F, cadence: Duration) -> Self {
        Self::with_gate(recipient, sequence, renderer, CadenceGate::new(cadence))
    }

    /// Create a driver with an explicit gate, e.g. one already open.
    pub fn with_gate(recipient: R, sequence: Sequence, renderer: F, gate: CadenceGate) -> Self {
        let span = tracing::debug_span!(
            "keyframe_playback",
            frames = sequence.len(),
            cadence = ?gate.interval(),
        );
        Self {
            recipient,
            renderer,
            state: PlaybackState::new(sequence),
            gate,
            span,
            stats: DriverStats::default(),
        }
    }

    /// Record this driver's events inside `span` instead of the default one.
    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Run one tick against the wall clock.
    pub fn tick(&mut self) -> Tick {
        self.tick_at(Instant::now())
    }

    /// Run one tick as if the clock read `now`.
    pub fn tick_at(&mut self, now: Instant) -> Tick {
        let span = self.span.clone();
        let _entered = span.enter();
        self.stats.ticks += 1;

        if !self.recipient.is_reachable() {
            tracing::debug!(rendered = self.stats.rendered, "recipient unreachable, stopping");
            return Tick::Stopped(StopReason::Unreachable);
        }

        let Some(index) = self.state.index() else {
            tracing::debug!(
                rendered = self.stats.rendered,
                failed = self.stats.failed,
                "playback finished"
            );
            return Tick::Stopped(StopReason::Finished);
        };

        if !self.gate.should_advance_at(now) {
            return Tick::Waiting;
        }

        let frame = &self.state.sequence()[index];
        let outcome = match self.renderer.render(&self.recipient, frame, self.gate.interval()) {
            Ok(()) => {
                self.stats.rendered += 1;
                tracing::trace!(index, "rendered frame");
                Tick::Rendered { index }
            }
            Err(err) => {
                self.stats.failed += 1;
                tracing::warn!(index, error = %err, "failed to render frame");
                Tick::RenderFailed { index }
            }
        };

        self.state = self.state.advance();
        self.gate.mark_rendered_at(now);
        outcome
    }
}

impl<R, F> Driver<R, F> {
    #[inline]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    #[inline]
    pub fn cadence(&self) -> Duration {
        self.gate.interval()
    }

    #[inline]
    pub fn recipient(&self) -> &R {
        &self.recipient
    }

    #[inline]
    pub fn stats(&self) -> DriverStats {
        self.stats
    }
}

impl<R, F> std::fmt::Debug for Driver<R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("state", &self.state)
            .field("gate", &self.gate)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<R, F> RepeatingTask for Driver<R, F>
where
    R: Recipient + Send,
    F: Renderer<R> + Send,
{
    fn run(&mut self) -> ControlFlow<()> {
        if self.tick().is_stopped() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}
