//! The in-memory mapping behind a read cache.
//!
//! [`CacheMap`] is either unbounded (a plain `HashMap`) or bounded with
//! least-recently-used eviction. The bounded form keeps its entries in a slab
//! of nodes linked into a doubly-linked recency list: the head is the most
//! recently used entry and the tail is the next eviction candidate. Lookup,
//! insertion and removal are all O(1).
//!
//! The map never drops an evicted entry on its own. [`CacheMap::insert`] hands
//! the evicted key and value back to the caller, which gets to observe them
//! before they go away.

use std::collections::HashMap;
use std::hash::Hash;

/// What happened to existing entries during an insert.
#[derive(Debug, PartialEq, Eq)]
pub struct InsertOutcome<K, V> {
    /// Previous value under the same key, if the insert replaced one.
    pub replaced: Option<V>,
    /// Least-recently-used entry pushed out to make room.
    pub evicted: Option<(K, V)>,
}

impl<K, V> InsertOutcome<K, V> {
    fn fresh() -> Self {
        Self {
            replaced: None,
            evicted: None,
        }
    }
}

/// Cache mapping with an optional entry bound.
#[derive(Debug)]
pub struct CacheMap<K, V> {
    inner: Inner<K, V>,
}

#[derive(Debug)]
enum Inner<K, V> {
    Unbounded(HashMap<K, V>),
    Bounded(LruMap<K, V>),
}

impl<K: Hash + Eq + Clone, V> CacheMap<K, V> {
    /// A mapping that never evicts.
    pub fn unbounded() -> Self {
        Self {
            inner: Inner::Unbounded(HashMap::new()),
        }
    }

    /// A mapping holding at most `capacity` entries (at least one).
    pub fn bounded(capacity: usize) -> Self {
        Self {
            inner: Inner::Bounded(LruMap::new(capacity)),
        }
    }

    /// The entry bound, or `None` for an unbounded mapping.
    pub fn capacity(&self) -> Option<usize> {
        match &self.inner {
            Inner::Unbounded(_) => None,
            Inner::Bounded(lru) => Some(lru.capacity),
        }
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match &mut self.inner {
            Inner::Unbounded(map) => map.get(key),
            Inner::Bounded(lru) => lru.get(key),
        }
    }

    /// Look up `key` without changing its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        match &self.inner {
            Inner::Unbounded(map) => map.get(key),
            Inner::Bounded(lru) => lru.peek(key),
        }
    }

    /// Insert or replace `key`, evicting the least recently used entry if the
    /// bound would be exceeded.
    pub fn insert(&mut self, key: K, value: V) -> InsertOutcome<K, V> {
        match &mut self.inner {
            Inner::Unbounded(map) => InsertOutcome {
                replaced: map.insert(key, value),
                evicted: None,
            },
            Inner::Bounded(lru) => lru.insert(key, value),
        }
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        match &mut self.inner {
            Inner::Unbounded(map) => map.remove(key),
            Inner::Bounded(lru) => lru.remove(key),
        }
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        match &self.inner {
            Inner::Unbounded(map) => map.len(),
            Inner::Bounded(lru) => lru.index.len(),
        }
    }

    /// Returns `true` if no entries are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entry, in no particular order. Recency is left untouched.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        match &self.inner {
            Inner::Unbounded(map) => Box::new(map.iter()),
            Inner::Bounded(lru) => Box::new(
                lru.nodes
                    .iter()
                    .flatten()
                    .map(|node| (&node.key, &node.value)),
            ),
        }
    }

    /// Remove and return every entry.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        match &mut self.inner {
            Inner::Unbounded(map) => map.drain().collect(),
            Inner::Bounded(lru) => lru.drain(),
        }
    }
}

type Index = usize;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<Index>,
    next: Option<Index>,
}

#[derive(Debug)]
struct LruMap<K, V> {
    index: HashMap<K, Index>,
    nodes: Vec<Option<Node<K, V>>>,
    free_list: Vec<Index>,
    head: Option<Index>,
    tail: Option<Index>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> LruMap<K, V> {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            index: HashMap::with_capacity(capacity),
            nodes: Vec::new(),
            free_list: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    fn node(&self, index: Index) -> &Node<K, V> {
        self.nodes[index].as_ref().expect("lru index points at a live node")
    }

    fn node_mut(&mut self, index: Index) -> &mut Node<K, V> {
        self.nodes[index].as_mut().expect("lru index points at a live node")
    }

    fn unlink(&mut self, index: Index) {
        let (prev, next) = {
            let node = self.node(index);
            (node.prev, node.next)
        };

        match prev {
            Some(prev_index) => self.node_mut(prev_index).next = next,
            None => self.head = next,
        }
        match next {
            Some(next_index) => self.node_mut(next_index).prev = prev,
            None => self.tail = prev,
        }

        let node = self.node_mut(index);
        node.prev = None;
        node.next = None;
    }

    fn push_front(&mut self, index: Index) {
        let old_head = self.head;
        {
            let node = self.node_mut(index);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head_index) => self.node_mut(head_index).prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
    }

    fn touch(&mut self, index: Index) {
        if self.head != Some(index) {
            self.unlink(index);
            self.push_front(index);
        }
    }

    fn release(&mut self, index: Index) -> Node<K, V> {
        self.unlink(index);
        let node = self.nodes[index]
            .take()
            .expect("lru index points at a live node");
        self.free_list.push(index);
        node
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let index = *self.index.get(key)?;
        self.touch(index);
        Some(&self.node(index).value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let index = *self.index.get(key)?;
        Some(&self.node(index).value)
    }

    fn insert(&mut self, key: K, value: V) -> InsertOutcome<K, V> {
        if let Some(&index) = self.index.get(&key) {
            let replaced = std::mem::replace(&mut self.node_mut(index).value, value);
            self.touch(index);
            return InsertOutcome {
                replaced: Some(replaced),
                evicted: None,
            };
        }

        let mut outcome = InsertOutcome::fresh();
        if self.index.len() >= self.capacity {
            if let Some(tail_index) = self.tail {
                let node = self.release(tail_index);
                self.index.remove(&node.key);
                outcome.evicted = Some((node.key, node.value));
            }
        }

        let node = Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let index = match self.free_list.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.index.insert(key, index);
        self.push_front(index);
        outcome
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let index = self.index.remove(key)?;
        Some(self.release(index).value)
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        self.index.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        self.nodes
            .drain(..)
            .flatten()
            .map(|node| (node.key, node.value))
            .collect()
    }
}
