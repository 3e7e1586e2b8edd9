use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use crate::error::{SourceError, SourceResult};
use crate::traits::Source;

/// In-memory, HashMap-based backing store.
///
/// Intended for tests and embedding. Entries are held behind a `RwLock` for
/// safe concurrent access and cloned on read.
pub struct InMemorySource<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K: Hash + Eq + Clone, V: Clone> InMemorySource<K, V> {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> SourceResult<usize> {
        let map = self.entries.read().map_err(SourceError::poisoned)?;
        Ok(map.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> SourceResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns `true` if `key` is stored.
    pub fn contains_key(&self, key: &K) -> SourceResult<bool> {
        let map = self.entries.read().map_err(SourceError::poisoned)?;
        Ok(map.contains_key(key))
    }

    /// All stored keys, in no particular order.
    pub fn keys(&self) -> SourceResult<Vec<K>> {
        let map = self.entries.read().map_err(SourceError::poisoned)?;
        Ok(map.keys().cloned().collect())
    }

    /// Remove all entries from the store.
    pub fn clear(&self) -> SourceResult<()> {
        self.entries
            .write()
            .map_err(SourceError::poisoned)?
            .clear();
        Ok(())
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Default for InMemorySource<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Source<K, V> for InMemorySource<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put(&self, key: K, value: V) -> SourceResult<()> {
        let mut map = self.entries.write().map_err(SourceError::poisoned)?;
        map.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> SourceResult<Option<V>> {
        let map = self.entries.read().map_err(SourceError::poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn delete(&self, key: &K) -> SourceResult<()> {
        let mut map = self.entries.write().map_err(SourceError::poisoned)?;
        map.remove(key);
        Ok(())
    }
}

impl<K, V> std::fmt::Debug for InMemorySource<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|map| map.len()).ok();
        f.debug_struct("InMemorySource")
            .field("entry_count", &count)
            .finish()
    }
}
