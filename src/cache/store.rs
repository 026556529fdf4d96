//! Cache Store Module
//!
//! Main cache engine combining a key index with an LRU list and TTL expiration.
//! The store is not synchronized; [`LruTtlCache`](crate::cache::LruTtlCache)
//! wraps it in a single mutex.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::cache::entry::expiry_for;
use crate::cache::{CacheEntry, LruList};

// == Cache Store ==
/// Bounded key/value storage with LRU eviction and TTL support.
///
/// Every method that looks at expiry takes the current instant explicitly, so
/// the store itself never reads a clock.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key to LRU list slot
    index: HashMap<K, usize>,
    /// Entries ordered by recency
    lru: LruList<CacheEntry<K, V>>,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore holding at most `capacity` entries.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "CacheStore capacity must be > 0");
        Self {
            index: HashMap::with_capacity(capacity),
            lru: LruList::with_capacity(capacity),
            capacity,
        }
    }

    // == Insert ==
    /// Stores a key-value pair expiring `ttl` after `now` (zero = never).
    ///
    /// If the key already exists, its value and expiry are replaced and it
    /// becomes most recently used; nothing is evicted. If the key is new and
    /// the store is full, the least recently used entry is evicted first and
    /// its key is returned.
    pub fn insert(&mut self, key: K, value: V, ttl: Duration, now: Instant) -> Option<K> {
        if let Some(&idx) = self.index.get(&key) {
            let entry = self.entry_mut(idx);
            entry.value = value;
            entry.expires_at = expiry_for(ttl, now);
            self.lru.move_to_front(idx);
            return None;
        }

        let evicted = if self.lru.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        let idx = self
            .lru
            .push_front(CacheEntry::new(key.clone(), value, ttl, now));
        self.index.insert(key, idx);

        debug_assert_eq!(self.index.len(), self.lru.len());
        evicted
    }

    // == Get ==
    /// Retrieves a value by key, promoting it to most recently used.
    ///
    /// An entry that has expired as of `now` is removed and reported as
    /// missing.
    pub fn get<Q>(&mut self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.index.get(key)?;

        if self.entry(idx).is_expired(now) {
            self.remove_slot(idx);
            return None;
        }

        self.lru.move_to_front(idx);
        Some(&self.entry(idx).value)
    }

    // == Peek ==
    /// Retrieves a live value without touching recency or removing anything.
    pub fn peek<Q>(&self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.entry(*self.index.get(key)?);
        (!entry.is_expired(now)).then_some(&entry.value)
    }

    // == Contains ==
    /// Checks whether an entry for `key` is physically stored, expired or not.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    // == Time To Live ==
    /// Remaining TTL of a live entry.
    ///
    /// # Returns
    /// - `None` if the key is absent or expired
    /// - `Some(None)` if the entry never expires
    /// - `Some(Some(remaining))` otherwise
    pub fn ttl_remaining<Q>(&self, key: &Q, now: Instant) -> Option<Option<Duration>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.entry(*self.index.get(key)?);
        (!entry.is_expired(now)).then(|| entry.ttl_remaining(now))
    }

    // == Remove ==
    /// Removes an entry by key, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.index.get(key)?;
        self.remove_slot(idx).map(|entry| entry.value)
    }

    // == Remove Expired ==
    /// Removes every entry that has expired as of `now`.
    ///
    /// Returns the removed keys, most recently used first.
    pub fn remove_expired(&mut self, now: Instant) -> Vec<K> {
        let expired: Vec<usize> = self
            .lru
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(idx, _)| idx)
            .collect();

        expired
            .into_iter()
            .filter_map(|idx| self.remove_slot(idx))
            .map(|entry| entry.key)
            .collect()
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.lru.clear();
    }

    // == Keys ==
    /// Stored keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.lru.iter().map(|(_, entry)| entry.key.clone()).collect()
    }

    // == Capacity ==
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Consistency ==
    /// Checks that the key index and the LRU list describe the same entries.
    pub fn is_consistent(&self) -> bool {
        if self.index.len() != self.lru.len() || self.lru.len() > self.capacity {
            return false;
        }
        if self.lru.iter().count() != self.lru.len() {
            return false;
        }
        self.index.iter().all(|(key, &idx)| {
            self.lru
                .get(idx)
                .map(|entry| entry.key == *key)
                .unwrap_or(false)
        })
    }

    fn evict_oldest(&mut self) -> Option<K> {
        let entry = self.lru.pop_back()?;
        self.index.remove(&entry.key);
        Some(entry.key)
    }

    fn remove_slot(&mut self, idx: usize) -> Option<CacheEntry<K, V>> {
        let entry = self.lru.remove(idx)?;
        self.index.remove(&entry.key);
        Some(entry)
    }

    fn entry(&self, idx: usize) -> &CacheEntry<K, V> {
        self.lru
            .get(idx)
            .expect("key index points at a free LRU slot")
    }

    fn entry_mut(&mut self, idx: usize) -> &mut CacheEntry<K, V> {
        self.lru
            .get_mut(idx)
            .expect("key index points at a free LRU slot")
    }
}
