//! Capacity-bounded ordered map with a pluggable eviction policy.
//!
//! Shared by the response cache and the conversation store. Both use FIFO:
//! the oldest-inserted entry goes first, regardless of how recently it was
//! read. `Lru` is available for callers that want reads to count.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use switchyard_types::error::GatewayError;

/// Which entry to drop when the map is over capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Oldest insertion first. Reads never change the order.
    #[default]
    Fifo,
    /// Least recently inserted or touched first.
    Lru,
}

/// Result of [`BoundedMap::insert`].
#[derive(Debug)]
pub struct InsertOutcome<K, V> {
    /// Previous value stored under the same key, if any.
    pub replaced: Option<V>,
    /// Entries pushed out to make room, oldest first.
    pub evicted: Vec<(K, V)>,
}

/// A `HashMap` that remembers insertion order and never grows past `capacity`.
#[derive(Debug)]
pub struct BoundedMap<K, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
    capacity: usize,
    policy: EvictionPolicy,
}

impl<K: Eq + Hash + Clone, V> BoundedMap<K, V> {
    /// Create an empty map. A zero capacity is a configuration error.
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Result<Self, GatewayError> {
        if capacity == 0 {
            return Err(GatewayError::Config(
                "bounded map capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            entries: HashMap::with_capacity(capacity.min(1024)),
            order: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            policy,
        })
    }

    /// Insert `value` under `key`.
    ///
    /// Re-inserting an existing key replaces the value and moves the key to
    /// the newest position. When the map grows past capacity the oldest
    /// entries are evicted and returned.
    pub fn insert(&mut self, key: K, value: V) -> InsertOutcome<K, V> {
        let replaced = self.entries.insert(key.clone(), value);
        if replaced.is_some() {
            self.unlink(&key);
        }
        self.order.push_back(key);

        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(value) = self.entries.remove(&oldest) {
                evicted.push((oldest, value));
            }
        }

        InsertOutcome { replaced, evicted }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Record a read. Moves the key to the newest position under `Lru`;
    /// does nothing under `Fifo`.
    pub fn touch(&mut self, key: &K) {
        if self.policy == EvictionPolicy::Lru && self.entries.contains_key(key) {
            self.unlink(key);
            self.order.push_back(key.clone());
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.unlink(key);
        Some(value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove every entry, returning them oldest first.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let mut drained = Vec::with_capacity(self.entries.len());
        while let Some(key) = self.order.pop_front() {
            if let Some(value) = self.entries.remove(&key) {
                drained.push((key, value));
            }
        }
        drained
    }

    /// Keys from oldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Values from oldest to newest.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|k| self.entries.get(k))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    fn unlink(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }
}
