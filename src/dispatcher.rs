//! Wiring a playback to a recipient and handing it to a timer.

use std::time::Duration;

use crate::config::{AnimationConfig, AnimationEntry, AnimationPlan, AnimationStyle};
use crate::driver::{Driver, Recipient, Renderer};
use crate::timer::{RepeatingTimer, MIN_PERIOD};
use crate::{Frame, Sequence};

/// Coarsest tick period used for a dispatched driver.
pub const BASE_TICK: Duration = Duration::from_millis(50);

/// What to play: a configuration to generate from, or explicit frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Playback {
    /// Frames generated from `config` by `style`, unless `config` carries
    /// explicit frames
    Config {
        config: AnimationConfig,
        style: AnimationStyle,
    },
    /// A ready-made sequence played as-is
    Frames(Sequence),
}

impl Playback {
    /// Materialize the frames.
    ///
    /// Explicit frames inside a configuration win over its style.
    pub fn into_sequence(self) -> Sequence {
        match self {
            Playback::Config { config, style } => Sequence::from_config(&config, style),
            Playback::Frames(sequence) => sequence,
        }
    }
}

impl From<Sequence> for Playback {
    fn from(sequence: Sequence) -> Self {
        Playback::Frames(sequence)
    }
}

impl From<Vec<Frame>> for Playback {
    fn from(frames: Vec<Frame>) -> Self {
        Playback::Frames(Sequence::from(frames))
    }
}

impl From<AnimationConfig> for Playback {
    fn from(config: AnimationConfig) -> Self {
        Playback::Config {
            config,
            style: AnimationStyle::default(),
        }
    }
}

impl From<(AnimationConfig, AnimationStyle)> for Playback {
    fn from((config, style): (AnimationConfig, AnimationStyle)) -> Self {
        Playback::Config { config, style }
    }
}

/// Tick period for a cadence: never coarser than the cadence itself, never
/// coarser than [`BASE_TICK`], never below [`MIN_PERIOD`].
pub fn tick_period_for(cadence: Duration) -> Duration {
    cadence.min(BASE_TICK).max(MIN_PERIOD)
}

/// A ready-to-schedule playback.
///
/// ```rust
/// use std::time::Duration;
/// use keyframe_player::{
///     AnimationConfig, AnimationStyle, Dispatcher, Frame, ManualTimer, Presence,
/// };
///
/// let config = AnimationConfig::new("Title", "Subtitle", "", 3);
/// let renderer = |_: &Presence, frame: &Frame, _: Duration| -> Result<(), String> {
///     println!("{} / {}", frame.primary, frame.secondary);
///     Ok(())
/// };
///
/// let timer = ManualTimer::new();
/// let dispatcher = Dispatcher::of(
///     Presence::new(),
///     (config, AnimationStyle::Countdown),
///     renderer,
///     Duration::from_millis(200),
/// );
/// assert_eq!(dispatcher.driver().state().len(), 4);
///
/// let handle = dispatcher.dispatch(&timer).unwrap();
/// assert_eq!(timer.len(), 1);
/// # drop(handle);
/// ```
pub struct Dispatcher<R, F> {
    driver: Driver<R, F>,
    tick_period: Duration,
}

impl<R, F> Dispatcher<R, F>
where
    R: Recipient,
    F: Renderer<R>,
{
    /// Build the driver for `playback`. An empty playback yields a driver
    /// that stops on its first tick.
    pub fn of(recipient: R, playback: impl Into<Playback>, renderer: F, cadence: Duration) -> Self {
        let sequence = playback.into().into_sequence();
        Self {
            driver: Driver::new(recipient, sequence, renderer, cadence),
            tick_period: tick_period_for(cadence),
        }
    }

    /// Override the timer period. Values below [`MIN_PERIOD`] are raised.
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period.max(MIN_PERIOD);
        self
    }

    /// See [`Driver::with_span`].
    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.driver = self.driver.with_span(span);
        self
    }

    /// Get the driver that will be scheduled.
    #[inline]
    pub fn driver(&self) -> &Driver<R, F> {
        &self.driver
    }

    /// Period the timer will tick the driver at.
    #[inline]
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Take the driver to tick it by hand.
    pub fn into_driver(self) -> Driver<R, F> {
        self.driver
    }

    /// Schedule the driver on `timer`, ticking from now on.
    pub fn dispatch<T>(self, timer: &T) -> Result<T::Handle, T::Error>
    where
        T: RepeatingTimer,
        R: Send + 'static,
        F: Send + 'static,
    {
        tracing::debug!(
            frames = self.driver.state().len(),
            cadence = ?self.driver.cadence(),
            tick_period = ?self.tick_period,
            "dispatching keyframe animation"
        );

        timer
            .schedule(Box::new(self.driver), Duration::ZERO, self.tick_period)
            .inspect_err(|err| tracing::error!(error = %err, "failed to schedule animation"))
    }
}

impl<R, F> std::fmt::Debug for Dispatcher<R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("driver", &self.driver)
            .field("tick_period", &self.tick_period)
            .finish()
    }
}

/// Dispatch one entry of a plan.
pub fn dispatch_entry<R, F, T>(
    entry: &AnimationEntry,
    recipient: R,
    renderer: F,
    timer: &T,
) -> Result<T::Handle, T::Error>
where
    R: Recipient + Send + 'static,
    F: Renderer<R> + Send + 'static,
    T: RepeatingTimer,
{
    let playback = Playback::Config {
        config: entry.config.clone(),
        style: entry.style,
    };
    let dispatcher = Dispatcher::of(recipient, playback, renderer, entry.cadence);
    let span = tracing::debug_span!(
        "keyframe_playback",
        style = %entry.style,
        title = %entry.config.title,
        frames = dispatcher.driver().state().len(),
        cadence = ?entry.cadence,
    );
    dispatcher.with_span(span).dispatch(timer)
}

/// Dispatch every animation of `plan` to the same recipient.
///
/// Entries are independent: one failing to schedule does not prevent the
/// others.
pub fn dispatch_plan<R, F, T>(
    plan: &AnimationPlan,
    recipient: &R,
    renderer: &F,
    timer: &T,
) -> Vec<Result<T::Handle, T::Error>>
where
    R: Recipient + Clone + Send + 'static,
    F: Renderer<R> + Clone + Send + 'static,
    T: RepeatingTimer,
{
    plan.animations
        .iter()
        .map(|entry| dispatch_entry(entry, recipient.clone(), renderer.clone(), timer))
        .collect()
}
