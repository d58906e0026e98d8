//! Materialized, shared frame lists.

use std::ops::Deref;
use std::sync::Arc;

use crate::config::{AnimationConfig, AnimationStyle};
use crate::source::{self, KeyframeSource};
use crate::Frame;

/// An immutable, cheaply cloneable list of frames.
///
/// Clones share storage, so one sequence can back any number of parallel
/// playbacks without copying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    frames: Arc<[Frame]>,
}

impl Sequence {
    /// Sequence with no frames. Playback over it is finished immediately.
    pub fn empty() -> Self {
        Self::from_frames(Vec::<Frame>::new())
    }

    /// Wrap an existing frame list.
    pub fn from_frames(frames: impl Into<Arc<[Frame]>>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    /// Collect the frames of `source` for `cycles`.
    pub fn generate(source: &dyn KeyframeSource, cycles: usize) -> Self {
        Self::from_frames(source::Frames::new(source, cycles).collect::<Vec<_>>())
    }

    /// Frames for `config`: its explicit frames when present, otherwise
    /// the frames `style` generates from its text fields.
    pub fn from_config(config: &AnimationConfig, style: AnimationStyle) -> Self {
        if config.has_explicit_frames() {
            return Self::from_frames(config.frames.clone());
        }
        let source = source::source_for(style, config);
        Self::generate(&source, config.cycles())
    }

    /// Get the frames in playback order.
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for Sequence {
    type Target = [Frame];

    fn deref(&self) -> &[Frame] {
        &self.frames
    }
}

impl From<Vec<Frame>> for Sequence {
    fn from(frames: Vec<Frame>) -> Self {
        Self::from_frames(frames)
    }
}

impl FromIterator<Frame> for Sequence {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self::from_frames(iter.into_iter().collect::<Vec<_>>())
    }
}
