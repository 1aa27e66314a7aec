// Copyright 2025 Nathan Hoos
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::engine::ReplaceEngine;
use crate::environment::{DEFAULT_CACHE_SIZE, DISABLE_CACHE, PATTERN_CACHE_SIZE};
use crate::error::Error;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One cached pattern.
///
/// Invariant: `pattern` is the exact byte-for-byte text that produced
/// `handle`. No normalization, no case folding.
struct CacheEntry<H> {
    pattern: String,
    handle: Arc<H>,
}

/// Hit/miss accounting, exposed to hosts for tuning cache capacity.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub compiled: u64,
    pub evicted: u64,
}

/// The lock-guarded slot array. Slot 0 is always the most recently used
/// pattern; the tail is the eviction candidate.
struct Slots<H> {
    entries: SmallVec<[CacheEntry<H>; DEFAULT_CACHE_SIZE]>,
    stats: CacheStats,
}

impl<H> Slots<H> {
    /// Linear scan for a byte-exact match. On a hit the entry rotates to
    /// the front: everything ahead of it shifts back one slot, relative
    /// order otherwise untouched. First match wins.
    fn promote(&mut self, pattern: &str) -> Option<Arc<H>> {
        let i = self.entries.iter().position(|e| e.pattern == pattern)?;
        if i > 0 {
            let entry = self.entries.remove(i);
            self.entries.insert(0, entry);
        }
        Some(Arc::clone(&self.entries[0].handle))
    }
}

/// A bounded most-recently-used-first cache of compiled patterns.
///
/// Compiling a pattern is expensive next to applying it, and query
/// workloads repeat the same few patterns across many rows, so one cache
/// instance sits in front of the engine for the lifetime of a function
/// registration and may be shared by every host thread invoking it.
///
/// Storage is a flat ordered array scanned linearly. Capacity is small
/// (tens), so shift-on-promote beats hash-indexed LRU structures on both
/// simplicity and locality; this is deliberate.
///
/// Handles are owned by their entries. Callers get an [`Arc`] clone that
/// must not outlive the call it was looked up for; eviction and cache
/// teardown drop the owning clone, which releases the compiled pattern
/// exactly once when the last borrow ends.
pub struct PatternCache<E: ReplaceEngine> {
    engine: E,
    capacity: usize,
    enabled: bool,
    slots: Mutex<Slots<E::Handle>>,
}

impl<E: ReplaceEngine> PatternCache<E> {
    /// A cache sized from `FASTER_REPLACE_CACHE_SIZE` (default 16).
    pub fn new(engine: E) -> Self {
        Self::with_capacity(engine, *PATTERN_CACHE_SIZE)
    }

    /// A cache holding at most `capacity` compiled patterns. Values below
    /// 1 are clamped to 1.
    pub fn with_capacity(engine: E, capacity: usize) -> Self {
        Self {
            engine,
            capacity: capacity.max(1),
            enabled: !*DISABLE_CACHE,
            slots: Mutex::new(Slots {
                entries: SmallVec::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Return the handle for `pattern`, compiling it on a miss.
    ///
    /// A hit promotes the entry to the front. A miss compiles outside the
    /// lock, then re-checks for a duplicate inserted by a concurrent
    /// caller before taking a slot; when the cache is full the least
    /// recently used entry is dropped first, releasing its handle.
    pub fn lookup_or_compile(&self, pattern: &str) -> Result<Arc<E::Handle>, Error> {
        if pattern.is_empty() {
            return Err(Error::EmptyPattern);
        }

        if !self.enabled {
            return self.compile(pattern).map(Arc::new);
        }

        {
            let mut slots = self.slots.lock().unwrap();
            if let Some(handle) = slots.promote(pattern) {
                slots.stats.hits += 1;
                return Ok(handle);
            }
            slots.stats.misses += 1;
        }

        // Compilation has no effect on shared state, so the lock is not
        // held across it; other lookups proceed meanwhile.
        let handle = Arc::new(self.compile(pattern)?);

        let mut slots = self.slots.lock().unwrap();
        // Another thread may have compiled and inserted the same pattern
        // while the lock was released. Reuse its entry so the cache never
        // holds two entries for one pattern; our handle is simply dropped.
        if let Some(existing) = slots.promote(pattern) {
            return Ok(existing);
        }

        if slots.entries.len() >= self.capacity {
            if let Some(evicted) = slots.entries.pop() {
                slots.stats.evicted += 1;
                debug!(pattern = %evicted.pattern, "evicting least recently used pattern");
            }
        }
        slots.entries.insert(
            0,
            CacheEntry {
                pattern: pattern.to_owned(),
                handle: Arc::clone(&handle),
            },
        );
        slots.stats.compiled += 1;
        Ok(handle)
    }

    fn compile(&self, pattern: &str) -> Result<E::Handle, Error> {
        self.engine
            .compile(pattern)
            .map_err(|message| Error::Compile {
                pattern: pattern.to_owned(),
                message,
            })
    }

    /// Number of patterns currently cached.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of patterns this cache will hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached pattern texts, most recently used first.
    pub fn patterns(&self) -> Vec<String> {
        self.slots
            .lock()
            .unwrap()
            .entries
            .iter()
            .map(|e| e.pattern.clone())
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.slots.lock().unwrap().stats
    }

    pub fn reset_stats(&self) {
        self.slots.lock().unwrap().stats = CacheStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BoundPattern, EngineError, PatternHandle};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[derive(Debug)]
    struct MockHandle {
        pattern: String,
        released: Arc<Mutex<Vec<String>>>,
    }

    impl Drop for MockHandle {
        fn drop(&mut self) {
            self.released.lock().unwrap().push(self.pattern.clone());
        }
    }

    struct MockReservation;

    impl PatternHandle for MockHandle {
        type Bound<'a> = MockReservation
        where
            Self: 'a;

        fn bind(&self, _subject: &str) -> Result<MockReservation, EngineError> {
            Ok(MockReservation)
        }
    }

    impl BoundPattern for MockReservation {
        fn replace_all(
            &mut self,
            _replacement: &str,
            _dest: &mut String,
            _capacity: usize,
        ) -> Result<usize, EngineError> {
            Ok(0)
        }
    }

    struct MockEngine {
        released: Arc<Mutex<Vec<String>>>,
        compiles: AtomicUsize,
        compile_delay: Option<Duration>,
    }

    impl MockEngine {
        fn new() -> Self {
            Self {
                released: Arc::new(Mutex::new(Vec::new())),
                compiles: AtomicUsize::new(0),
                compile_delay: None,
            }
        }
    }

    impl ReplaceEngine for MockEngine {
        type Handle = MockHandle;

        fn compile(&self, pattern: &str) -> Result<MockHandle, String> {
            if pattern.starts_with('(') {
                return Err("missing closing parenthesis".to_owned());
            }
            if let Some(delay) = self.compile_delay {
                thread::sleep(delay);
            }
            self.compiles.fetch_add(1, Ordering::SeqCst);
            Ok(MockHandle {
                pattern: pattern.to_owned(),
                released: Arc::clone(&self.released),
            })
        }
    }

    #[test]
    fn empty_pattern_rejected_without_compiling() {
        let cache = PatternCache::with_capacity(MockEngine::new(), 4);
        assert!(matches!(
            cache.lookup_or_compile(""),
            Err(Error::EmptyPattern)
        ));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.engine.compiles.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn order_is_most_recently_used_first() {
        let cache = PatternCache::with_capacity(MockEngine::new(), 4);
        for p in ["p1", "p2", "p3"] {
            cache.lookup_or_compile(p).unwrap();
        }
        assert_eq!(cache.patterns(), ["p3", "p2", "p1"]);

        // Re-looking-up p1 moves it to the front without disturbing the
        // relative order of the others.
        cache.lookup_or_compile("p1").unwrap();
        assert_eq!(cache.patterns(), ["p1", "p3", "p2"]);
    }

    #[test]
    fn hit_returns_the_cached_handle() {
        let cache = PatternCache::with_capacity(MockEngine::new(), 4);
        let first = cache.lookup_or_compile("abc").unwrap();
        let second = cache.lookup_or_compile("abc").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.engine.compiles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn eviction_drops_exactly_the_least_recently_used() {
        let cache = PatternCache::with_capacity(MockEngine::new(), 2);
        for p in ["a", "b", "a", "c"] {
            cache.lookup_or_compile(p).unwrap();
        }
        assert_eq!(cache.patterns(), ["c", "a"]);

        let released = cache.engine.released.lock().unwrap().clone();
        assert_eq!(released, ["b"]);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let cache = PatternCache::with_capacity(MockEngine::new(), 3);
        for i in 0..20 {
            cache.lookup_or_compile(&format!("p{}", i % 7)).unwrap();
            assert!(cache.len() <= 3);
        }
    }

    #[test]
    fn repeated_lookups_never_duplicate_an_entry() {
        let cache = PatternCache::with_capacity(MockEngine::new(), 4);
        for p in ["x", "y", "x", "x", "y", "z", "x"] {
            cache.lookup_or_compile(p).unwrap();
        }
        let mut patterns = cache.patterns();
        patterns.sort();
        patterns.dedup();
        assert_eq!(patterns.len(), cache.len());
    }

    #[test]
    fn compile_error_leaves_cache_untouched() {
        let cache = PatternCache::with_capacity(MockEngine::new(), 4);
        cache.lookup_or_compile("ok").unwrap();

        let err = cache.lookup_or_compile("(").unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("("));
        assert!(rendered.contains("missing closing parenthesis"));

        assert_eq!(cache.patterns(), ["ok"]);
        assert_eq!(cache.engine.compiles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn teardown_releases_every_handle_once() {
        let released = {
            let cache = PatternCache::with_capacity(MockEngine::new(), 3);
            for p in ["a", "b", "c"] {
                cache.lookup_or_compile(p).unwrap();
            }
            Arc::clone(&cache.engine.released)
        };
        let mut released = released.lock().unwrap().clone();
        released.sort();
        assert_eq!(released, ["a", "b", "c"]);
    }

    #[test]
    fn stats_count_hits_misses_and_evictions() {
        let cache = PatternCache::with_capacity(MockEngine::new(), 2);
        for p in ["a", "b", "a", "c"] {
            cache.lookup_or_compile(p).unwrap();
        }
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.compiled, 3);
        assert_eq!(stats.evicted, 1);

        cache.reset_stats();
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn disabled_cache_compiles_fresh_every_time() {
        let mut cache = PatternCache::with_capacity(MockEngine::new(), 4);
        cache.enabled = false;
        cache.lookup_or_compile("p").unwrap();
        cache.lookup_or_compile("p").unwrap();
        assert_eq!(cache.engine.compiles.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn concurrent_lookups_of_one_pattern_collapse_to_one_entry() {
        let mut engine = MockEngine::new();
        engine.compile_delay = Some(Duration::from_millis(10));
        let cache = Arc::new(PatternCache::with_capacity(engine, 4));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache.lookup_or_compile("shared").unwrap();
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(cache.patterns(), ["shared"]);

        // Every handle compiled beyond the one that won the slot has
        // already been dropped again.
        let compiles = cache.engine.compiles.load(Ordering::SeqCst);
        let released = cache.engine.released.lock().unwrap().len();
        assert_eq!(released, compiles - 1);
    }
}
