//! Write-through read cache layer.
//!
//! [`ReadCache`] keeps an in-memory mapping in front of a wrapped source.
//! Reads are served from the mapping when possible; misses are resolved
//! against the wrapped source and remembered, including misses that found
//! nothing (stored as [`Cached::Absent`]). Writes and deletes go straight
//! through to the wrapped source and then update the mapping, so the cache
//! never holds state that still needs flushing.
//!
//! # Binary keys
//!
//! The mapping is keyed by `M`, a [`MapKey`] derived from the caller's key.
//! For ordinary keys `M` is the key type itself. [`BytesKeyReadCache`] keys
//! its mapping by [`ByteKey`] so lookups always compare byte content; callers
//! and observers still only ever see `Vec<u8>`.
//!
//! # Concurrency
//!
//! The mapping sits behind a `Mutex` that is held only while the mapping is
//! read or updated, never across a call into the wrapped source. Writers are
//! serialized by a second lock that is held across the wrapped write, so the
//! mapping sees writes in the same order as the wrapped source.
//!
//! Every write bumps a counter kept under the mapping lock. A miss records
//! the counter before reading the wrapped source and only fills its slot if
//! the counter is unchanged and the slot is still vacant; otherwise a write
//! landed in between and the fetched value may already be stale. Two threads
//! missing on the same key may both query the wrapped source, and the mapping
//! still ends with a single slot.

use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use srcchain_types::ByteKey;
use tracing::{debug, trace};

use crate::cached::Cached;
use crate::config::CacheConfig;
use crate::error::{SourceError, SourceResult};
use crate::estimator::MemSizeEstimator;
use crate::lru::{CacheMap, InsertOutcome};
use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::traits::{CacheObserver, CachedSource, ChainedSource, Source};

/// Key type used inside a cache mapping, derived from the caller's key `K`.
pub trait MapKey<K>: Hash + Eq + Clone + Send + Sync {
    fn from_key(key: &K) -> Self;

    fn to_key(&self) -> K;
}

impl<K: Hash + Eq + Clone + Send + Sync> MapKey<K> for K {
    fn from_key(key: &K) -> Self {
        key.clone()
    }

    fn to_key(&self) -> K {
        self.clone()
    }
}

impl MapKey<Vec<u8>> for ByteKey {
    fn from_key(key: &Vec<u8>) -> Self {
        ByteKey::new(key)
    }

    fn to_key(&self) -> Vec<u8> {
        self.to_vec()
    }
}

/// Read cache over a byte-keyed source, with a content-compared mapping.
pub type BytesKeyReadCache<V, S> = ReadCache<Vec<u8>, V, S, ByteKey>;

struct SizeEstimators<K, V> {
    key: Arc<dyn MemSizeEstimator<K>>,
    value: Arc<dyn MemSizeEstimator<V>>,
}

impl<K, V> SizeEstimators<K, V> {
    fn slot_size(&self, key: &K, slot: &Cached<V>) -> u64 {
        let value_size = slot
            .as_option()
            .map_or(0, |value| self.value.estimate_size(value));
        self.key.estimate_size(key) + value_size
    }
}

/// The mapping plus the number of writes applied to it so far.
struct Slots<M, V> {
    map: CacheMap<M, Cached<V>>,
    writes: u64,
}

/// Write-through caching layer over a wrapped source `S`.
pub struct ReadCache<K, V, S, M = K> {
    source: S,
    cache: Mutex<Slots<M, V>>,
    write_lock: Mutex<()>,
    observer: Option<Arc<dyn CacheObserver<K, V>>>,
    estimators: Option<SizeEstimators<K, V>>,
    estimated_size: AtomicU64,
    stats: Option<CacheStats>,
    _key: PhantomData<fn() -> K>,
}

impl<K, V, S> ReadCache<K, V, S>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    S: Source<K, V>,
{
    /// Wrap `source` with an unbounded cache.
    pub fn new(source: S) -> Self {
        Self::with_map_key(source)
    }
}

impl<V, S> ReadCache<Vec<u8>, V, S, ByteKey>
where
    V: Clone + Send + Sync,
    S: Source<Vec<u8>, V>,
{
    /// Wrap a byte-keyed `source` with an unbounded, content-compared cache.
    pub fn bytes_key(source: S) -> Self {
        Self::with_map_key(source)
    }
}

impl<K, V, S, M> ReadCache<K, V, S, M>
where
    K: Send + Sync,
    V: Clone + Send + Sync,
    S: Source<K, V>,
    M: MapKey<K>,
{
    fn with_map_key(source: S) -> Self {
        Self {
            source,
            cache: Mutex::new(Slots {
                map: CacheMap::unbounded(),
                writes: 0,
            }),
            write_lock: Mutex::new(()),
            observer: None,
            estimators: None,
            estimated_size: AtomicU64::new(0),
            stats: None,
            _key: PhantomData,
        }
    }

    /// Build a cache from `config`, validating it first.
    pub fn from_config(source: S, config: &CacheConfig) -> SourceResult<Self> {
        config.validate()?;
        let mut cache = Self::with_map_key(source);
        if let Some(capacity) = config.max_capacity {
            cache = cache.with_max_capacity(capacity)?;
        }
        if config.track_stats {
            cache = cache.with_stats();
        }
        debug!(
            max_capacity = ?config.max_capacity,
            track_stats = config.track_stats,
            "read cache configured"
        );
        Ok(cache)
    }

    /// Bound the cache to `max_capacity` slots with least-recently-used
    /// eviction. Slots cached so far are dropped and reported to the
    /// observer.
    ///
    /// Evicted slots are reported to the observer and then dropped; nothing
    /// is written anywhere, since the wrapped source already holds every
    /// value the cache has seen written.
    pub fn with_max_capacity(mut self, max_capacity: usize) -> SourceResult<Self> {
        if max_capacity == 0 {
            return Err(SourceError::Configuration(
                "max_capacity must be at least 1".into(),
            ));
        }
        let mut previous =
            std::mem::replace(&mut self.slots_mut().map, CacheMap::bounded(max_capacity));
        for (map_key, slot) in previous.drain() {
            self.slot_removed(&<M as MapKey<K>>::to_key(&map_key), Some(&slot));
        }
        Ok(self)
    }

    /// Install the receiver for cache mutation hooks.
    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver<K, V>>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Track the estimated memory held by cached keys and values. Slots
    /// already cached are measured with the new estimators.
    pub fn with_size_estimators(
        mut self,
        key: Arc<dyn MemSizeEstimator<K>>,
        value: Arc<dyn MemSizeEstimator<V>>,
    ) -> Self {
        let estimators = SizeEstimators { key, value };
        let total: u64 = self
            .slots_mut()
            .map
            .iter()
            .map(|(map_key, slot)| {
                estimators.slot_size(&<M as MapKey<K>>::to_key(map_key), slot)
            })
            .sum();
        self.estimated_size = AtomicU64::new(total);
        self.estimators = Some(estimators);
        self
    }

    /// Keep hit/miss counters.
    pub fn with_stats(mut self) -> Self {
        self.stats = Some(CacheStats::new());
        self
    }

    /// Counter snapshot, or `None` if stats are not tracked.
    pub fn stats(&self) -> Option<CacheStatsSnapshot> {
        self.stats.as_ref().map(CacheStats::snapshot)
    }

    /// The slot bound, or `None` for an unbounded cache.
    pub fn max_capacity(&self) -> SourceResult<Option<usize>> {
        Ok(self.lock()?.map.capacity())
    }

    /// Number of slots currently cached, known-missing slots included.
    pub fn cached_len(&self) -> SourceResult<usize> {
        Ok(self.lock()?.map.len())
    }

    /// Drop every cached slot. The wrapped source is not touched.
    pub fn clear_cache(&self) -> SourceResult<()> {
        let mut slots = self.lock()?;
        for (map_key, slot) in slots.map.drain() {
            self.slot_removed(&<M as MapKey<K>>::to_key(&map_key), Some(&slot));
        }
        Ok(())
    }

    fn lock(&self) -> SourceResult<MutexGuard<'_, Slots<M, V>>> {
        self.cache.lock().map_err(SourceError::poisoned)
    }

    // Builders own the cache exclusively; a poisoned lock still holds a
    // consistent mapping.
    fn slots_mut(&mut self) -> &mut Slots<M, V> {
        self.cache.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, f: impl FnOnce(&CacheStats)) {
        if let Some(stats) = &self.stats {
            f(stats);
        }
    }

    fn slot_size(&self, key: &K, slot: &Cached<V>) -> u64 {
        self.estimators
            .as_ref()
            .map_or(0, |est| est.slot_size(key, slot))
    }

    fn slot_added(&self, key: &K, slot: &Cached<V>) {
        self.estimated_size
            .fetch_add(self.slot_size(key, slot), Ordering::Relaxed);
        if let Some(observer) = &self.observer {
            observer.cache_added(key, slot.as_option());
        }
    }

    fn slot_removed(&self, key: &K, slot: Option<&Cached<V>>) {
        if let Some(slot) = slot {
            self.estimated_size
                .fetch_sub(self.slot_size(key, slot), Ordering::Relaxed);
        }
        if let Some(observer) = &self.observer {
            observer.cache_removed(key, slot.and_then(Cached::as_option));
        }
    }

    /// Insert `slot` under `map_key` and settle the bookkeeping. Must be
    /// called with the mapping lock held.
    fn insert_locked(&self, slots: &mut Slots<M, V>, map_key: M, key: &K, slot: Cached<V>) {
        let outcome = slots.map.insert(map_key, slot.clone());
        self.settle_insert(key, &slot, outcome);
    }

    fn settle_insert(&self, key: &K, slot: &Cached<V>, outcome: InsertOutcome<M, Cached<V>>) {
        if let Some(replaced) = outcome.replaced {
            self.estimated_size
                .fetch_sub(self.slot_size(key, &replaced), Ordering::Relaxed);
        }
        if let Some((evicted_key, evicted_slot)) = outcome.evicted {
            let evicted_key = <M as MapKey<K>>::to_key(&evicted_key);
            trace!(present = evicted_slot.is_present(), "evicting cache slot");
            self.record(CacheStats::record_eviction);
            self.slot_removed(&evicted_key, Some(&evicted_slot));
        }
        self.slot_added(key, slot);
    }

    /// Fill the slot for a miss, unless a write landed since `writes_seen`
    /// or another reader filled it first. Returns the value to hand back.
    fn fill_miss(
        &self,
        map_key: M,
        key: &K,
        fetched: Option<V>,
        writes_seen: u64,
    ) -> SourceResult<Option<V>> {
        let mut slots = self.lock()?;
        if let Some(slot) = slots.map.get(&map_key) {
            return Ok(slot.as_option().cloned());
        }
        if slots.writes != writes_seen {
            trace!("write raced the miss; fetched value not cached");
            return Ok(fetched);
        }
        self.insert_locked(&mut slots, map_key, key, Cached::from(fetched.clone()));
        Ok(fetched)
    }

    fn write_guard(&self) -> SourceResult<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(SourceError::poisoned)
    }
}

impl<K, V, S, M> Source<K, V> for ReadCache<K, V, S, M>
where
    K: Send + Sync,
    V: Clone + Send + Sync,
    S: Source<K, V>,
    M: MapKey<K>,
{
    fn put(&self, key: K, value: V) -> SourceResult<()> {
        let map_key = <M as MapKey<K>>::from_key(&key);
        let _writer = self.write_guard()?;
        self.source.put(key, value.clone())?;
        self.record(CacheStats::record_put);

        let key = <M as MapKey<K>>::to_key(&map_key);
        let mut slots = self.lock()?;
        slots.writes = slots.writes.wrapping_add(1);
        self.insert_locked(&mut slots, map_key, &key, Cached::Present(value));
        Ok(())
    }

    fn get(&self, key: &K) -> SourceResult<Option<V>> {
        let map_key = <M as MapKey<K>>::from_key(key);
        let writes_seen = {
            let mut slots = self.lock()?;
            match slots.map.get(&map_key) {
                Some(Cached::Present(value)) => {
                    self.record(CacheStats::record_hit);
                    return Ok(Some(value.clone()));
                }
                Some(Cached::Absent) => {
                    self.record(CacheStats::record_negative_hit);
                    return Ok(None);
                }
                None => {}
            }
            slots.writes
        };

        self.record(CacheStats::record_miss);
        let fetched = self.source.get(key)?;
        trace!(found = fetched.is_some(), "cache miss resolved from source");
        self.fill_miss(map_key, key, fetched, writes_seen)
    }

    fn delete(&self, key: &K) -> SourceResult<()> {
        let map_key = <M as MapKey<K>>::from_key(key);
        let _writer = self.write_guard()?;
        self.source.delete(key)?;
        self.record(CacheStats::record_delete);

        let mut slots = self.lock()?;
        slots.writes = slots.writes.wrapping_add(1);
        let removed = slots.map.remove(&map_key);
        self.slot_removed(key, removed.as_ref());
        Ok(())
    }

    /// Writes are already propagated, so there is never anything to flush.
    fn flush(&self) -> SourceResult<bool> {
        Ok(false)
    }
}

impl<K, V, S, M> CachedSource<K, V> for ReadCache<K, V, S, M>
where
    K: Send + Sync,
    V: Clone + Send + Sync,
    S: Source<K, V>,
    M: MapKey<K>,
{
    fn get_cached(&self, key: &K) -> SourceResult<Option<Cached<V>>> {
        let map_key = <M as MapKey<K>>::from_key(key);
        Ok(self.lock()?.map.peek(&map_key).cloned())
    }

    fn has_modified(&self) -> bool {
        false
    }

    fn modified(&self) -> Vec<K> {
        Vec::new()
    }

    fn estimated_size(&self) -> u64 {
        self.estimated_size.load(Ordering::Relaxed)
    }
}

impl<K, V, S, M> ChainedSource<K, V> for ReadCache<K, V, S, M>
where
    S: Source<K, V>,
{
    type Inner = S;

    fn source(&self) -> &S {
        &self.source
    }

    fn flush_source(&self) -> bool {
        false
    }
}

impl<K, V, S: std::fmt::Debug, M> std::fmt::Debug for ReadCache<K, V, S, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadCache")
            .field("source", &self.source)
            .field("estimated_size", &self.estimated_size.load(Ordering::Relaxed))
            .field("stats", &self.stats)
            .finish()
    }
}
