//! Playback position over a frame sequence.

use crate::{Frame, Sequence};

/// Where a playback is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Index of the next frame to render
    Active(usize),
    /// Every frame has been rendered (or there were none)
    Finished,
}

/// Immutable playback position over a shared [`Sequence`].
///
/// Advancing returns a new value and leaves the old one untouched, so the
/// same sequence can back several playbacks at once.
///
/// ## Example
///
/// ```rust
/// use keyframe_player::{Frame, PlaybackState, Sequence};
///
/// let seq = Sequence::from(vec![Frame::new("A", "a"), Frame::new("B", "b")]);
/// let state = PlaybackState::new(seq);
/// assert_eq!(state.current_frame(), Some(&Frame::new("A", "a")));
///
/// let state = state.advance().advance();
/// assert!(state.is_finished());
/// assert_eq!(state.current_frame(), None);
///
/// // Finished is terminal.
/// assert!(state.advance().is_finished());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackState {
    sequence: Sequence,
    phase: PlaybackPhase,
}

impl PlaybackState {
    /// Start at the first frame, or finished if `sequence` is empty.
    pub fn new(sequence: Sequence) -> Self {
        let phase = if sequence.is_empty() {
            PlaybackPhase::Finished
        } else {
            PlaybackPhase::Active(0)
        };
        Self { sequence, phase }
    }

    #[inline]
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    #[inline]
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Index of the next frame to render, if any.
    #[inline]
    pub fn index(&self) -> Option<usize> {
        match self.phase {
            PlaybackPhase::Active(index) => Some(index),
            PlaybackPhase::Finished => None,
        }
    }

    /// The frame to render next.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.index().and_then(|index| self.sequence.get(index))
    }

    /// Move to the next frame, or to finished after the last one.
    #[must_use]
    pub fn advance(&self) -> Self {
        let phase = match self.phase {
            PlaybackPhase::Active(index) if index + 1 < self.sequence.len() => {
                PlaybackPhase::Active(index + 1)
            }
            _ => PlaybackPhase::Finished,
        };
        Self {
            sequence: self.sequence.clone(),
            phase,
        }
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.phase == PlaybackPhase::Finished
    }

    /// Total number of frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Frames not rendered yet.
    pub fn remaining(&self) -> usize {
        match self.phase {
            PlaybackPhase::Active(index) => self.sequence.len() - index,
            PlaybackPhase::Finished => 0,
        }
    }
}
