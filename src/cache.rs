//! Bounded, expiring memo of constructed frames.
//!
//! Generators that cycle through a small set of distinct frames (palettes,
//! wobble) can route construction through a [`FrameCache`] so repeated
//! cycles reuse the already-built value instead of allocating a new one.
//! The cache is best-effort: an evicted or expired entry is simply built
//! again on the next lookup.
//!
//! # Example
//! ```
//! use keyframe_player::{Frame, FrameCache};
//!
//! let mut cache = FrameCache::new();
//! let frame = cache.get_or_create(2, |i| Frame::new("Title", ".".repeat(i + 1)));
//! assert_eq!(frame.secondary(), "...");
//!
//! // Second lookup is a hit; the creator is not called.
//! let again = cache.get_or_create(2, |_| unreachable!());
//! assert_eq!(again, frame);
//! assert_eq!(cache.stats().hits, 1);
//! ```

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::Frame;

/// Default maximum number of cached frames.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default time an entry stays valid after it was written.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of lookups served from the cache.
    pub hits: u64,
    /// Number of lookups that had to build the frame.
    pub misses: u64,
    /// Number of entries dropped because they outlived the ttl.
    pub expired: u64,
    /// Current number of entries.
    pub size: usize,
    /// Maximum capacity.
    pub capacity: usize,
}

impl CacheStats {
    /// Hit rate between 0.0 and 1.0.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Entry {
    frame: Frame,
    inserted_at: Instant,
}

/// Frame memo keyed by frame index.
///
/// Eviction is by insertion order once `capacity` is reached: lookups use
/// `peek`, so reading an entry never refreshes it. Entries older than the
/// ttl are treated as absent and rebuilt.
///
/// `FrameCache` is not thread-safe on its own; use [`SharedFrameCache`] to
/// share one instance between drivers.
#[derive(Debug)]
pub struct FrameCache {
    entries: LruCache<usize, Entry>,
    ttl: Duration,
    hits: u64,
    misses: u64,
    expired: u64,
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCache {
    /// Create a cache with the default capacity (100) and ttl (10 minutes).
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Create a cache with explicit limits.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_limits(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
            hits: 0,
            misses: 0,
            expired: 0,
        }
    }

    /// Return the cached frame for `key`, building it with `create` on a miss.
    pub fn get_or_create<F>(&mut self, key: usize, create: F) -> Frame
    where
        F: FnOnce(usize) -> Frame,
    {
        self.get_or_create_at(key, Instant::now(), create)
    }

    /// Same as [`get_or_create`](Self::get_or_create) with an explicit clock reading.
    pub fn get_or_create_at<F>(&mut self, key: usize, now: Instant, create: F) -> Frame
    where
        F: FnOnce(usize) -> Frame,
    {
        if let Some(frame) = self.lookup_counted(key, now) {
            return frame;
        }
        let frame = create(key);
        self.store(key, frame.clone(), now);
        frame
    }

    /// Live entry for `key`, recorded as a hit or a miss.
    fn lookup_counted(&mut self, key: usize, now: Instant) -> Option<Frame> {
        let found = self.lookup(key, now);
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    fn store(&mut self, key: usize, frame: Frame, now: Instant) {
        self.entries.push(
            key,
            Entry {
                frame,
                inserted_at: now,
            },
        );
    }

    fn lookup(&mut self, key: usize, now: Instant) -> Option<Frame> {
        let entry = self.entries.peek(&key)?;
        if now.saturating_duration_since(entry.inserted_at) >= self.ttl {
            self.entries.pop(&key);
            self.expired += 1;
            return None;
        }
        Some(entry.frame.clone())
    }

    /// Check whether a live entry exists for `key` at `now`.
    pub fn contains_at(&self, key: usize, now: Instant) -> bool {
        self.entries
            .peek(&key)
            .is_some_and(|entry| now.saturating_duration_since(entry.inserted_at) < self.ttl)
    }

    /// Number of stored entries, including ones that expired but were not looked up yet.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            expired: self.expired,
            size: self.entries.len(),
            capacity: self.capacity(),
        }
    }
}

/// Cloneable, thread-safe handle to one [`FrameCache`].
///
/// Clones share the same entries, so several drivers (one per recipient)
/// can reuse each other's frames.
#[derive(Debug, Clone, Default)]
pub struct SharedFrameCache {
    inner: Arc<Mutex<FrameCache>>,
}

impl SharedFrameCache {
    /// Shared cache with default limits.
    pub fn new() -> Self {
        Self::from_cache(FrameCache::new())
    }

    /// Wrap an existing cache.
    pub fn from_cache(cache: FrameCache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// See [`FrameCache::get_or_create`].
    ///
    /// `create` runs without the lock held, so it may use this same cache.
    /// Two threads missing the same key at once may both build it; the
    /// later insert wins and both return equal frames.
    pub fn get_or_create<F>(&self, key: usize, create: F) -> Frame
    where
        F: FnOnce(usize) -> Frame,
    {
        let now = Instant::now();
        if let Some(frame) = self.lock().lookup_counted(key, now) {
            return frame;
        }
        let frame = create(key);
        self.lock().store(key, frame.clone(), now);
        frame
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // Entries are plain values; a panic elsewhere cannot leave them half-written.
    fn lock(&self) -> MutexGuard<'_, FrameCache> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_for(i: usize) -> Frame {
        Frame::new("T", i.to_string())
    }

    #[test]
    fn test_hit_skips_creator() {
        let mut cache = FrameCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_create(7, |i| {
                calls += 1;
                frame_for(i)
            });
        }
        assert_eq!(calls, 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_capacity_evicts_oldest_insert() {
        let mut cache = FrameCache::new();
        let now = Instant::now();
        for i in 0..=DEFAULT_CAPACITY {
            cache.get_or_create_at(i, now, frame_for);
            assert!(cache.len() <= DEFAULT_CAPACITY);
        }

        assert_eq!(cache.len(), DEFAULT_CAPACITY);
        assert!(!cache.contains_at(0, now));
        assert!(cache.contains_at(DEFAULT_CAPACITY, now));
    }

    #[test]
    fn test_reads_do_not_refresh_insertion_order() {
        let mut cache = FrameCache::with_limits(2, DEFAULT_TTL);
        let now = Instant::now();
        cache.get_or_create_at(0, now, frame_for);
        cache.get_or_create_at(1, now, frame_for);

        // Reading 0 must not protect it from eviction.
        cache.get_or_create_at(0, now, frame_for);
        cache.get_or_create_at(2, now, frame_for);

        assert!(!cache.contains_at(0, now));
        assert!(cache.contains_at(1, now));
        assert!(cache.contains_at(2, now));
    }

    #[test]
    fn test_expired_entry_is_rebuilt() {
        let mut cache = FrameCache::new();
        let start = Instant::now();
        cache.get_or_create_at(3, start, frame_for);

        let later = start + DEFAULT_TTL + Duration::from_secs(1);
        assert!(!cache.contains_at(3, later));

        let mut rebuilt = false;
        let frame = cache.get_or_create_at(3, later, |i| {
            rebuilt = true;
            frame_for(i)
        });
        assert!(rebuilt);
        assert_eq!(frame, frame_for(3));
        assert_eq!(cache.stats().expired, 1);
        assert!(cache.contains_at(3, later));
    }

    #[test]
    fn test_entry_alive_just_before_ttl() {
        let mut cache = FrameCache::with_limits(4, Duration::from_secs(60));
        let start = Instant::now();
        cache.get_or_create_at(1, start, frame_for);
        assert!(cache.contains_at(1, start + Duration::from_secs(59)));
        assert!(!cache.contains_at(1, start + Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let cache = FrameCache::with_limits(0, DEFAULT_TTL);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_shared_cache_across_threads() {
        let shared = SharedFrameCache::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..10 {
                        assert_eq!(cache.get_or_create(i, frame_for), frame_for(i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = shared.stats();
        assert_eq!(stats.hits + stats.misses, 40);
        assert!(stats.misses >= 10);
        assert_eq!(stats.size, 10);
    }

    #[test]
    fn test_shared_creator_may_reenter_cache() {
        let shared = SharedFrameCache::new();
        let outer = shared.get_or_create(1, |i| {
            let inner = shared.get_or_create(i + 1, frame_for);
            inner.with_primary(|p| format!("{p}!"))
        });

        assert_eq!(outer, Frame::new("T!", "2"));
        assert_eq!(shared.get_or_create(2, |_| unreachable!()), frame_for(2));
        assert_eq!(shared.stats().size, 2);
    }
}
