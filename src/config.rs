//! Animation configuration records.
//!
//! With the `toml` feature a whole [`AnimationPlan`] can be read from a
//! file:
//!
//! ```toml
//! [[animation]]
//! style = "countdown"
//! cadence = "200ms"
//! title = "Title Message"
//! subtitle = "Subtitle Message"
//! frame_count = 5
//! ```

use std::time::Duration;

use crate::source::MAX_FRAMES;
use crate::Frame;

/// Cadence used when a plan entry does not name one.
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(200);

/// Text and size of one animation.
///
/// When `frames` is non-empty it is played as-is and the other fields are
/// only informational; otherwise the frames are generated from the text
/// fields by an [`AnimationStyle`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnimationConfig {
    /// Primary text of every generated frame
    pub title: String,
    /// Secondary text the styles decorate
    pub subtitle: String,
    /// Symbol appended by the static and repeat-character styles
    pub character: String,
    /// Requested number of frames. Out of range values are clamped on use.
    pub frame_count: i64,
    /// Explicit frames overriding generation.
    pub frames: Vec<Frame>,
}

impl AnimationConfig {
    pub fn new(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        character: impl Into<String>,
        frame_count: i64,
    ) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            character: character.into(),
            frame_count,
            frames: Vec::new(),
        }
    }

    /// Attach explicit frames.
    #[must_use]
    pub fn with_frames(mut self, frames: impl IntoIterator<Item = Frame>) -> Self {
        self.frames = frames.into_iter().collect();
        self
    }

    /// Check if explicit frames take precedence over generation.
    #[inline]
    pub fn has_explicit_frames(&self) -> bool {
        !self.frames.is_empty()
    }

    /// `frame_count` clamped to `0..=MAX_FRAMES`.
    pub fn cycles(&self) -> usize {
        clamp_frame_count(self.frame_count)
    }
}

/// Clamp a requested frame count to `0..=MAX_FRAMES`.
pub fn clamp_frame_count(requested: i64) -> usize {
    usize::try_from(requested.max(0))
        .unwrap_or(MAX_FRAMES)
        .min(MAX_FRAMES)
}

/// Generator used to turn an [`AnimationConfig`] into frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AnimationStyle {
    /// Identical `subtitle + " " + character` frames
    #[default]
    Static,
    /// Subtitle followed by a number counting down to 0
    Countdown,
    /// Subtitle followed by a growing run of `character`
    RepeatCharacter,
    /// Cycling loading dots
    Loading,
    /// Cycling spinner glyphs
    Spinning,
    /// Subtitle nudged left and right
    Wobble,
}

impl AnimationStyle {
    /// Every style, in declaration order.
    pub const ALL: [AnimationStyle; 6] = [
        AnimationStyle::Static,
        AnimationStyle::Countdown,
        AnimationStyle::RepeatCharacter,
        AnimationStyle::Loading,
        AnimationStyle::Spinning,
        AnimationStyle::Wobble,
    ];

    /// Lowercase name as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            AnimationStyle::Static => "static",
            AnimationStyle::Countdown => "countdown",
            AnimationStyle::RepeatCharacter => "repeat_character",
            AnimationStyle::Loading => "loading",
            AnimationStyle::Spinning => "spinning",
            AnimationStyle::Wobble => "wobble",
        }
    }
}

impl std::fmt::Display for AnimationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One animation of a plan: what to play and how fast.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationEntry {
    /// Generator for the frames; static when omitted
    #[cfg_attr(feature = "serde", serde(default))]
    pub style: AnimationStyle,
    /// Minimum time between frames; [`DEFAULT_CADENCE`] when omitted
    #[cfg_attr(
        feature = "serde",
        serde(with = "humantime_serde", default = "default_cadence")
    )]
    pub cadence: Duration,
    /// Text and size of the animation
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub config: AnimationConfig,
}

impl AnimationEntry {
    pub fn new(style: AnimationStyle, cadence: Duration, config: AnimationConfig) -> Self {
        Self {
            style,
            cadence,
            config,
        }
    }
}

#[cfg(feature = "serde")]
fn default_cadence() -> Duration {
    DEFAULT_CADENCE
}

/// A set of animations played together to one recipient.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationPlan {
    /// Entries in file order, written as `[[animation]]` tables
    #[cfg_attr(feature = "serde", serde(default, rename = "animation"))]
    pub animations: Vec<AnimationEntry>,
}

impl AnimationPlan {
    /// Parse a plan from a TOML string.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::ParsingConfig)
    }

    /// Read and parse a plan file.
    #[cfg(feature = "toml")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let plan_str =
            std::fs::read_to_string(path).map_err(|source| ConfigError::ReadingFile {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_toml_str(&plan_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

#[cfg(feature = "toml")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read animation plan from path '{}'", .path.display())]
    ReadingFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    ParsingConfig(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_negative_to_zero() {
        assert_eq!(clamp_frame_count(-5), 0);
        assert_eq!(AnimationConfig::new("t", "s", "", -1).cycles(), 0);
    }

    #[test]
    fn test_clamp_large_to_cap() {
        assert_eq!(clamp_frame_count(100), 100);
        assert_eq!(clamp_frame_count(101), MAX_FRAMES);
        assert_eq!(clamp_frame_count(i64::MAX), MAX_FRAMES);
    }

    #[test]
    fn test_explicit_frames_flag() {
        let config = AnimationConfig::new("Start Title", "Start subtitle", "", 10);
        assert!(!config.has_explicit_frames());

        let config = config.with_frames([Frame::new("A", "A"), Frame::new("B", "B")]);
        assert!(config.has_explicit_frames());
        assert_eq!(config.frames.len(), 2);
    }

    #[test]
    fn test_style_names() {
        let names: Vec<_> = AnimationStyle::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            ["static", "countdown", "repeat_character", "loading", "spinning", "wobble"]
        );
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_parse_plan() {
        let plan = AnimationPlan::from_toml_str(
            r#"
            [[animation]]
            style = "countdown"
            cadence = "250ms"
            title = "Title Message"
            subtitle = "Subtitle Message"
            frame_count = 5

            [[animation]]
            style = "wobble"
            title = "T"
            subtitle = "S"
            frame_count = -3

            [[animation]]
            title = "Custom"
            frames = [
                { primary = "A", secondary = "a" },
                { primary = "B" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(plan.len(), 3);

        let countdown = &plan.animations[0];
        assert_eq!(countdown.style, AnimationStyle::Countdown);
        assert_eq!(countdown.cadence, Duration::from_millis(250));
        assert_eq!(countdown.config.cycles(), 5);
        assert_eq!(countdown.config.character, "");

        let wobble = &plan.animations[1];
        assert_eq!(wobble.cadence, DEFAULT_CADENCE);
        assert_eq!(wobble.config.cycles(), 0);

        let custom = &plan.animations[2];
        assert_eq!(custom.style, AnimationStyle::Static);
        assert_eq!(
            custom.config.frames,
            vec![Frame::new("A", "a"), Frame::new("B", "")]
        );
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_parse_error_is_reported() {
        let err = AnimationPlan::from_toml_str("[[animation]]\nstyle = \"sparkle\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParsingConfig(_)));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_missing_file_is_reported() {
        let err = AnimationPlan::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
