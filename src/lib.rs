//! # keyframe-player
//!
//! Cadence-gated keyframe playback for title-style animations shown to one
//! recipient at a time.
//!
//! This crate provides the scheduling and playback core:
//! - Generating frame sequences from a short configuration (countdown,
//!   loading dots, spinner, wobble, repeated character or static)
//! - Caching generated frames so repeated playbacks reuse them
//! - Advancing an immutable playback position frame by frame
//! - Gating frame changes on a minimum cadence
//! - Driving a playback from a repeating timer until every frame was shown
//!   or the recipient went away
//!
//! Presentation is left to the host through the [`Renderer`] trait.
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for data structures
//! - `toml` - Load an [`AnimationPlan`] from a TOML file
//! - `tokio` - A [`RepeatingTimer`] backed by tokio tasks
//! - `logging` - Install a stderr `tracing` subscriber with [`logging::init`]
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use keyframe_player::{
//!     AnimationConfig, AnimationStyle, Dispatcher, Frame, Presence, ThreadTimer,
//! };
//!
//! let config = AnimationConfig::new("Title", "Subtitle", "", 2);
//! let renderer = |_: &Presence, frame: &Frame, _: Duration| -> Result<(), String> {
//!     println!("{} | {}", frame.primary, frame.secondary);
//!     Ok(())
//! };
//!
//! // 3 frames: "Subtitle 2", "Subtitle 1", "Subtitle 0"
//! let handle = Dispatcher::of(
//!     Presence::new(),
//!     (config, AnimationStyle::Countdown),
//!     renderer,
//!     Duration::from_millis(5),
//! )
//! .dispatch(&ThreadTimer::new())
//! .unwrap();
//!
//! handle.join().unwrap();
//! ```

mod cache;
mod cadence;
mod config;
mod dispatcher;
mod driver;
mod error;
mod frame;
mod sequence;
pub mod source;
mod state;
pub mod timer;

#[cfg(feature = "logging")]
pub mod logging;

pub use cache::{CacheStats, FrameCache, SharedFrameCache, DEFAULT_CAPACITY, DEFAULT_TTL};
pub use cadence::CadenceGate;
pub use config::{
    clamp_frame_count, AnimationConfig, AnimationEntry, AnimationPlan, AnimationStyle,
    DEFAULT_CADENCE,
};
pub use dispatcher::{dispatch_entry, dispatch_plan, tick_period_for, Dispatcher, Playback, BASE_TICK};
pub use driver::{Driver, DriverStats, Presence, Recipient, Renderer, StopReason, Tick};
pub use error::{BoxError, TimerError};
pub use frame::Frame;
pub use sequence::Sequence;
pub use source::{KeyframeSource, MAX_FRAMES};
pub use state::{PlaybackPhase, PlaybackState};
pub use timer::{ManualHandle, ManualTimer, RepeatingTask, RepeatingTimer, ThreadHandle, ThreadTimer};

#[cfg(feature = "toml")]
pub use config::ConfigError;

#[cfg(feature = "tokio")]
pub use timer::{TokioHandle, TokioTimer};
