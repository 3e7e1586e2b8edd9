//! The contracts every layer of a source chain speaks.
//!
//! A chain is built by nesting layers: each layer implements [`Source`] for
//! the key/value types it exposes and holds the next layer, which implements
//! [`Source`] for the types it understands. Capabilities beyond plain
//! key-value access ([`CachedSource`], [`ChainedSource`]) are separate traits
//! so that backing stores only have to provide the basic contract.

use std::sync::Arc;

use crate::cached::Cached;
use crate::error::SourceResult;

/// Synchronous key-value store contract.
///
/// Implementations must be thread-safe (`Send + Sync`). Failures of the
/// underlying storage are returned as errors and never converted into a
/// "not found" result.
pub trait Source<K, V>: Send + Sync {
    /// Insert or replace the value stored under `key`.
    fn put(&self, key: K, value: V) -> SourceResult<()>;

    /// Point lookup.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &K) -> SourceResult<Option<V>>;

    /// Remove `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &K) -> SourceResult<()>;

    /// Persist pending state.
    ///
    /// Returns `Ok(true)` if there was unflushed state and it was written,
    /// `Ok(false)` if there was nothing to flush.
    fn flush(&self) -> SourceResult<bool> {
        Ok(false)
    }

    /// Store `Some(value)` under `key`, or delete `key` when given `None`.
    fn set(&self, key: K, value: Option<V>) -> SourceResult<()> {
        match value {
            Some(value) => self.put(key, value),
            None => self.delete(&key),
        }
    }
}

/// A layer that keeps an in-memory view of the entries it has seen.
pub trait CachedSource<K, V>: Source<K, V> {
    /// Inspect the cache slot for `key` without touching the wrapped store.
    ///
    /// `Ok(None)` means the key is not cached at all; `Some(Cached::Absent)`
    /// means the key is cached as known-missing.
    fn get_cached(&self, key: &K) -> SourceResult<Option<Cached<V>>>;

    /// Whether the layer holds writes not yet propagated to its source.
    fn has_modified(&self) -> bool;

    /// Keys with writes not yet propagated to the source.
    fn modified(&self) -> Vec<K>;

    /// Estimated memory held by the cache, in bytes. Zero when no size
    /// estimators are configured.
    fn estimated_size(&self) -> u64;
}

/// A layer that delegates persistence to exactly one wrapped source.
pub trait ChainedSource<SK, SV> {
    /// The wrapped layer.
    type Inner: Source<SK, SV>;

    /// The wrapped source this layer delegates to.
    fn source(&self) -> &Self::Inner;

    /// Whether flushing this layer also flushes the wrapped source.
    fn flush_source(&self) -> bool;
}

/// Receiver for cache mutation notifications.
///
/// Hooks run synchronously while the cache holds its lock, so they must not
/// call back into the cache that notifies them. `value` is `None` when the
/// slot records a known-missing key or when nothing was cached.
pub trait CacheObserver<K, V>: Send + Sync {
    /// A slot for `key` was inserted or replaced.
    fn cache_added(&self, _key: &K, _value: Option<&V>) {}

    /// The slot for `key` was removed, either explicitly or by eviction.
    fn cache_removed(&self, _key: &K, _value: Option<&V>) {}
}

impl<K, V, T> Source<K, V> for Arc<T>
where
    T: Source<K, V> + ?Sized,
{
    fn put(&self, key: K, value: V) -> SourceResult<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &K) -> SourceResult<Option<V>> {
        (**self).get(key)
    }

    fn delete(&self, key: &K) -> SourceResult<()> {
        (**self).delete(key)
    }

    fn flush(&self) -> SourceResult<bool> {
        (**self).flush()
    }
}

impl<K, V, T> Source<K, V> for &T
where
    T: Source<K, V> + ?Sized,
{
    fn put(&self, key: K, value: V) -> SourceResult<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &K) -> SourceResult<Option<V>> {
        (**self).get(key)
    }

    fn delete(&self, key: &K) -> SourceResult<()> {
        (**self).delete(key)
    }

    fn flush(&self) -> SourceResult<bool> {
        (**self).flush()
    }
}
