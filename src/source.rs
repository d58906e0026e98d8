//! Frame sequence generators.
//!
//! A [`KeyframeSource`] describes how to build frame `i` of an animation;
//! [`KeyframeSource::frames`] turns it into a lazy, restartable iterator.
//! Every source goes through [`Frames::new`], which is the single place the
//! [`MAX_FRAMES`] cap is applied.

use crate::cache::SharedFrameCache;
use crate::config::{AnimationConfig, AnimationStyle};
use crate::Frame;

/// Upper bound on the number of frames any source produces.
pub const MAX_FRAMES: usize = 100;

/// Loading dots palette.
pub const LOADING: &[&str] = &[".", "..", "..."];
/// ASCII spinner palette.
pub const SPINNING: &[&str] = &["|", "/", "-", "\\"];

/// A pure description of an animation's frames.
pub trait KeyframeSource {
    /// Number of frames produced for `cycles`, before the global cap.
    fn frame_count(&self, cycles: usize) -> usize {
        cycles
    }

    /// Build frame `index` of a sequence that is `len` frames long.
    fn frame_at(&self, index: usize, len: usize) -> Frame;

    /// Key that fully determines the content of frame `index`.
    ///
    /// Two indices with the same key must build equal frames. Used by
    /// [`Cached`] to share entries between repeated cycles.
    fn cache_key(&self, index: usize, _len: usize) -> usize {
        index
    }

    /// Lazily produce the frames for `cycles`.
    fn frames(&self, cycles: usize) -> Frames<'_>
    where
        Self: Sized,
    {
        Frames::new(self, cycles)
    }
}

impl<S: KeyframeSource + ?Sized> KeyframeSource for Box<S> {
    fn frame_count(&self, cycles: usize) -> usize {
        (**self).frame_count(cycles)
    }

    fn frame_at(&self, index: usize, len: usize) -> Frame {
        (**self).frame_at(index, len)
    }

    fn cache_key(&self, index: usize, len: usize) -> usize {
        (**self).cache_key(index, len)
    }
}

/// Iterator over the frames of a [`KeyframeSource`].
///
/// Calling `frames` again starts a fresh iterator.
#[derive(Clone)]
pub struct Frames<'a> {
    source: &'a dyn KeyframeSource,
    index: usize,
    len: usize,
}

impl<'a> Frames<'a> {
    pub fn new(source: &'a dyn KeyframeSource, cycles: usize) -> Self {
        Self {
            source,
            index: 0,
            len: source.frame_count(cycles).min(MAX_FRAMES),
        }
    }
}

impl std::fmt::Debug for Frames<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frames")
            .field("index", &self.index)
            .field("len", &self.len)
            .finish()
    }
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.index >= self.len {
            return None;
        }
        let frame = self.source.frame_at(self.index, self.len);
        self.index += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}

impl std::iter::FusedIterator for Frames<'_> {}

/// `cycles` identical `(title, subtitle + " " + character)` frames.
#[derive(Clone, Debug)]
pub struct Static {
    frame: Frame,
}

impl Static {
    pub fn new(config: &AnimationConfig) -> Self {
        Self {
            frame: Frame::new(
                config.title.clone(),
                format!("{} {}", config.subtitle, config.character),
            ),
        }
    }
}

impl KeyframeSource for Static {
    fn frame_at(&self, _index: usize, _len: usize) -> Frame {
        self.frame.clone()
    }

    fn cache_key(&self, _index: usize, _len: usize) -> usize {
        0
    }
}

/// Counts down to 0, one number per frame.
///
/// `cycles` requests `cycles + 1` frames (`cycles, ..., 0`). When the cap
/// shortens the sequence it starts lower, so the last frame is always 0.
#[derive(Clone, Debug)]
pub struct Countdown {
    title: String,
    subtitle: String,
}

impl Countdown {
    pub fn new(config: &AnimationConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
        }
    }
}

impl KeyframeSource for Countdown {
    fn frame_count(&self, cycles: usize) -> usize {
        cycles.saturating_add(1)
    }

    fn frame_at(&self, index: usize, len: usize) -> Frame {
        let remaining = self.cache_key(index, len);
        Frame::new(self.title.clone(), format!("{} {}", self.subtitle, remaining))
    }

    fn cache_key(&self, index: usize, len: usize) -> usize {
        len.saturating_sub(index + 1)
    }
}

/// Subtitle followed by `character` repeated `i + 1` times.
#[derive(Clone, Debug)]
pub struct RepeatCharacter {
    title: String,
    subtitle: String,
    character: String,
}

impl RepeatCharacter {
    pub fn new(config: &AnimationConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            character: config.character.clone(),
        }
    }
}

impl KeyframeSource for RepeatCharacter {
    fn frame_at(&self, index: usize, _len: usize) -> Frame {
        Frame::new(
            self.title.clone(),
            format!("{} {}", self.subtitle, self.character.repeat(index + 1)),
        )
    }
}

/// Cycles through a fixed list of symbols shown under the title.
#[derive(Clone, Debug)]
pub struct Palette {
    title: String,
    symbols: Vec<String>,
}

impl Palette {
    pub fn new<I, S>(config: &AnimationConfig, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: config.title.clone(),
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// [`LOADING`] dots.
    pub fn loading(config: &AnimationConfig) -> Self {
        Self::new(config, LOADING.iter().copied())
    }

    /// [`SPINNING`] glyphs.
    pub fn spinning(config: &AnimationConfig) -> Self {
        Self::new(config, SPINNING.iter().copied())
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

impl KeyframeSource for Palette {
    fn frame_count(&self, cycles: usize) -> usize {
        if self.symbols.is_empty() {
            0
        } else {
            cycles
        }
    }

    /// An empty palette yields the title over an empty line.
    fn frame_at(&self, index: usize, len: usize) -> Frame {
        let symbol = self
            .symbols
            .get(self.cache_key(index, len))
            .cloned()
            .unwrap_or_default();
        Frame::new(self.title.clone(), symbol)
    }

    fn cache_key(&self, index: usize, _len: usize) -> usize {
        index % self.symbols.len().max(1)
    }
}

/// Subtitle padded on alternating sides.
#[derive(Clone, Debug)]
pub struct Wobble {
    title: String,
    subtitle: String,
}

impl Wobble {
    pub fn new(config: &AnimationConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
        }
    }
}

impl KeyframeSource for Wobble {
    fn frame_at(&self, index: usize, _len: usize) -> Frame {
        let secondary = if index % 2 == 0 {
            format!("{} ", self.subtitle)
        } else {
            format!(" {}", self.subtitle)
        };
        Frame::new(self.title.clone(), secondary)
    }

    fn cache_key(&self, index: usize, _len: usize) -> usize {
        index % 2
    }
}

/// Memoizing decorator around any source.
///
/// Produces frames equal to the wrapped source's, building each distinct
/// [`cache_key`](KeyframeSource::cache_key) at most once while it stays
/// in the cache. One cache must only be shared between sources that agree
/// on what each key means.
#[derive(Clone, Debug)]
pub struct Cached<S> {
    inner: S,
    cache: SharedFrameCache,
}

impl<S: KeyframeSource> Cached<S> {
    /// Wrap `inner` with a private cache.
    pub fn new(inner: S) -> Self {
        Self::with_cache(inner, SharedFrameCache::new())
    }

    pub fn with_cache(inner: S, cache: SharedFrameCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &SharedFrameCache {
        &self.cache
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: KeyframeSource> KeyframeSource for Cached<S> {
    fn frame_count(&self, cycles: usize) -> usize {
        self.inner.frame_count(cycles)
    }

    fn frame_at(&self, index: usize, len: usize) -> Frame {
        let key = self.inner.cache_key(index, len);
        self.cache
            .get_or_create(key, |_| self.inner.frame_at(index, len))
    }

    fn cache_key(&self, index: usize, len: usize) -> usize {
        self.inner.cache_key(index, len)
    }
}

/// Boxed source as returned by [`source_for`].
pub type BoxedSource = Box<dyn KeyframeSource + Send + Sync>;

/// Build the generator for `style` over `config`.
pub fn source_for(style: AnimationStyle, config: &AnimationConfig) -> BoxedSource {
    match style {
        AnimationStyle::Static => Box::new(Static::new(config)),
        AnimationStyle::Countdown => Box::new(Countdown::new(config)),
        AnimationStyle::RepeatCharacter => Box::new(RepeatCharacter::new(config)),
        AnimationStyle::Loading => Box::new(Palette::loading(config)),
        AnimationStyle::Spinning => Box::new(Palette::spinning(config)),
        AnimationStyle::Wobble => Box::new(Wobble::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AnimationConfig {
        AnimationConfig::new("T", "S", "x", 3)
    }

    fn secondaries(source: &impl KeyframeSource, cycles: usize) -> Vec<String> {
        source.frames(cycles).map(|f| f.secondary).collect()
    }

    #[test]
    fn test_countdown() {
        let countdown = Countdown::new(&config());
        assert_eq!(secondaries(&countdown, 3), ["S 3", "S 2", "S 1", "S 0"]);
        assert!(countdown.frames(3).all(|f| f.primary == "T"));
    }

    #[test]
    fn test_countdown_zero_cycles() {
        assert_eq!(secondaries(&Countdown::new(&config()), 0), ["S 0"]);
    }

    #[test]
    fn test_countdown_capped_still_ends_at_zero() {
        let frames: Vec<_> = Countdown::new(&config()).frames(500).collect();
        assert_eq!(frames.len(), MAX_FRAMES);
        assert_eq!(frames[0].secondary, "S 99");
        assert_eq!(frames[MAX_FRAMES - 1].secondary, "S 0");
    }

    #[test]
    fn test_repeat_character() {
        let source = RepeatCharacter::new(&config());
        assert_eq!(secondaries(&source, 3), ["S x", "S xx", "S xxx"]);
    }

    #[test]
    fn test_spinning_wraps() {
        let source = Palette::spinning(&config());
        let indices: Vec<_> = source
            .frames(6)
            .map(|f| SPINNING.iter().position(|s| *s == f.secondary).unwrap())
            .collect();
        assert_eq!(indices, [0, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn test_loading() {
        let source = Palette::loading(&config());
        assert_eq!(secondaries(&source, 4), [".", "..", "...", "."]);
        assert!(source.frames(4).all(|f| f.primary == "T"));
    }

    #[test]
    fn test_empty_palette_produces_nothing() {
        let source = Palette::new(&config(), Vec::<String>::new());
        assert_eq!(source.frames(10).count(), 0);
        assert_eq!(source.frame_at(3, 10), Frame::new("T", ""));
    }

    #[test]
    fn test_wobble() {
        let source = Wobble::new(&config());
        assert_eq!(secondaries(&source, 3), ["S ", " S", "S "]);
    }

    #[test]
    fn test_static() {
        let source = Static::new(&config());
        let frames: Vec<_> = source.frames(2).collect();
        assert_eq!(frames, vec![Frame::new("T", "S x"); 2]);
    }

    #[test]
    fn test_cap_applies_to_every_style() {
        let config = config();
        for style in AnimationStyle::ALL {
            let source = source_for(style, &config);
            assert_eq!(source.frames(1_000).len(), MAX_FRAMES, "{style}");
        }
    }

    #[test]
    fn test_lengths_follow_cycles() {
        let config = config();
        for style in AnimationStyle::ALL {
            let source = source_for(style, &config);
            let expected = if style == AnimationStyle::Countdown { 8 } else { 7 };
            assert_eq!(source.frames(7).count(), expected, "{style}");
        }
    }

    #[test]
    fn test_frames_restart() {
        let source = Wobble::new(&config());
        let first: Vec<_> = source.frames(5).collect();
        let second: Vec<_> = source.frames(5).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cached_matches_uncached() {
        let config = config();
        for style in AnimationStyle::ALL {
            let plain: Vec<_> = source_for(style, &config).frames(40).collect();
            let cached = Cached::new(source_for(style, &config));
            let first: Vec<_> = cached.frames(40).collect();
            let second: Vec<_> = cached.frames(40).collect();
            assert_eq!(plain, first, "{style}");
            assert_eq!(plain, second, "{style}");
        }
    }

    #[test]
    fn test_cached_palette_builds_each_symbol_once() {
        let cached = Cached::new(Palette::spinning(&config()));
        assert_eq!(cached.frames(12).count(), 12);

        let stats = cached.cache().stats();
        assert_eq!(stats.misses, SPINNING.len() as u64);
        assert_eq!(stats.hits, 12 - SPINNING.len() as u64);
    }

    #[test]
    fn test_cached_countdown_across_cycle_counts() {
        let cached = Cached::new(Countdown::new(&config()));
        let short: Vec<_> = cached.frames(2).map(|f| f.secondary).collect();
        let long: Vec<_> = cached.frames(4).map(|f| f.secondary).collect();
        assert_eq!(short, ["S 2", "S 1", "S 0"]);
        assert_eq!(long, ["S 4", "S 3", "S 2", "S 1", "S 0"]);
    }
}
