//! Wrapped sources and observers shared by the unit tests.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Barrier, Mutex};

use crate::error::{SourceError, SourceResult};
use crate::memory::InMemorySource;
use crate::traits::{CacheObserver, Source};

/// In-memory source that counts every call it receives.
#[derive(Debug)]
pub struct CountingSource<K, V> {
    inner: InMemorySource<K, V>,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl<K: Hash + Eq + Clone, V: Clone> CountingSource<K, V> {
    pub fn new() -> Self {
        Self {
            inner: InMemorySource::new(),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Read the backing map directly, without counting.
    pub fn peek(&self, key: &K) -> Option<V>
    where
        K: Send + Sync,
        V: Send + Sync,
    {
        self.inner.get(key).unwrap()
    }
}

impl<K, V> Source<K, V> for CountingSource<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put(&self, key: K, value: V) -> SourceResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value)
    }

    fn get(&self, key: &K) -> SourceResult<Option<V>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn delete(&self, key: &K) -> SourceResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key)
    }
}

/// In-memory source whose calls fail while `failing` is set.
#[derive(Debug)]
pub struct FlakySource<K, V> {
    inner: InMemorySource<K, V>,
    pub failing: AtomicBool,
}

impl<K: Hash + Eq + Clone, V: Clone> FlakySource<K, V> {
    pub fn new() -> Self {
        Self {
            inner: InMemorySource::new(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> SourceResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::Backend("disk unavailable".into()));
        }
        Ok(())
    }
}

impl<K, V> Source<K, V> for FlakySource<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put(&self, key: K, value: V) -> SourceResult<()> {
        self.check()?;
        self.inner.put(key, value)
    }

    fn get(&self, key: &K) -> SourceResult<Option<V>> {
        self.check()?;
        self.inner.get(key)
    }

    fn delete(&self, key: &K) -> SourceResult<()> {
        self.check()?;
        self.inner.delete(key)
    }
}

/// In-memory source whose next `get` stops after reading, until resumed.
///
/// Arm it, start the read on another thread, call `wait_until_fetched`,
/// do whatever should land between the read and the cache fill, then call
/// `resume`.
pub struct PausingSource<K, V> {
    inner: InMemorySource<K, V>,
    armed: AtomicBool,
    fetched: Barrier,
    resumed: Barrier,
}

impl<K: Hash + Eq + Clone, V: Clone> PausingSource<K, V> {
    pub fn new() -> Self {
        Self {
            inner: InMemorySource::new(),
            armed: AtomicBool::new(false),
            fetched: Barrier::new(2),
            resumed: Barrier::new(2),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn wait_until_fetched(&self) {
        self.fetched.wait();
    }

    pub fn resume(&self) {
        self.resumed.wait();
    }
}

impl<K, V> Source<K, V> for PausingSource<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn put(&self, key: K, value: V) -> SourceResult<()> {
        self.inner.put(key, value)
    }

    fn get(&self, key: &K) -> SourceResult<Option<V>> {
        let value = self.inner.get(key)?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.fetched.wait();
            self.resumed.wait();
        }
        Ok(value)
    }

    fn delete(&self, key: &K) -> SourceResult<()> {
        self.inner.delete(key)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event<K, V> {
    Added(K, Option<V>),
    Removed(K, Option<V>),
}

/// Observer that records every hook invocation in order.
pub struct RecordingObserver<K, V> {
    events: Mutex<Vec<Event<K, V>>>,
}

impl<K: Clone, V: Clone> RecordingObserver<K, V> {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<Event<K, V>> {
        self.events.lock().unwrap().clone()
    }

    pub fn removals(&self) -> Vec<(K, Option<V>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Removed(key, value) => Some((key, value)),
                Event::Added(..) => None,
            })
            .collect()
    }
}

impl<K, V> CacheObserver<K, V> for RecordingObserver<K, V>
where
    K: Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn cache_added(&self, key: &K, value: Option<&V>) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Added(key.clone(), value.cloned()));
    }

    fn cache_removed(&self, key: &K, value: Option<&V>) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Removed(key.clone(), value.cloned()));
    }
}
