//! The frame value rendered on every accepted tick.

/// One discrete visual unit of an animation.
///
/// A frame is a title overlay split in two lines: the large `primary` text
/// and the smaller `secondary` text below it. Frames are plain values;
/// transformations return a new frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Main line (title)
    pub primary: String,
    /// Second line (subtitle)
    #[cfg_attr(feature = "serde", serde(default))]
    pub secondary: String,
}

impl Frame {
    /// Create a new frame from its two lines.
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Get the primary text.
    #[inline]
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Get the secondary text.
    #[inline]
    pub fn secondary(&self) -> &str {
        &self.secondary
    }

    /// Return a copy of this frame with the primary text rewritten by `f`.
    #[must_use]
    pub fn with_primary<F>(&self, f: F) -> Self
    where
        F: FnOnce(&str) -> String,
    {
        Self {
            primary: f(&self.primary),
            secondary: self.secondary.clone(),
        }
    }

    /// Return a copy of this frame with the secondary text rewritten by `f`.
    #[must_use]
    pub fn with_secondary<F>(&self, f: F) -> Self
    where
        F: FnOnce(&str) -> String,
    {
        Self {
            primary: self.primary.clone(),
            secondary: f(&self.secondary),
        }
    }

    /// Check if both lines are empty.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

impl<P, S> From<(P, S)> for Frame
where
    P: Into<String>,
    S: Into<String>,
{
    fn from((primary, secondary): (P, S)) -> Self {
        Self::new(primary, secondary)
    }
}
