//! Thread-safe memoization cache with optional LRU bound and TTL.
//!
//! With neither a bound nor a TTL this is a plain memo table: a key, once
//! inserted, stays until `clear`. `max_entries` enables least-recently-used
//! eviction and `ttl` expires entries on read.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::CachePolicy;

/// Cached value with its insertion time.
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// String-keyed memo cache shared across threads.
pub struct MemoCache<V> {
    inner: Mutex<CacheInner<V>>,
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Recency order, oldest first. Only maintained when bounded.
    order: VecDeque<String>,
    max_entries: Option<usize>,
    ttl: Option<Duration>,
}

impl<V> CacheInner<V> {
    fn is_expired(&self, entry: &CacheEntry<V>) -> bool {
        self.ttl
            .map(|ttl| entry.inserted_at.elapsed() >= ttl)
            .unwrap_or(false)
    }

    fn touch(&mut self, key: &str) {
        if self.max_entries.is_none() {
            return;
        }
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        if self.max_entries.is_some() {
            self.order.retain(|k| k != key);
        }
    }

    /// Returns false when the cache is configured to hold nothing.
    fn make_room(&mut self) -> bool {
        match self.max_entries {
            Some(0) => false,
            Some(max) => {
                while self.entries.len() >= max {
                    match self.order.pop_front() {
                        Some(oldest) => {
                            self.entries.remove(&oldest);
                        }
                        None => break,
                    }
                }
                true
            }
            None => true,
        }
    }

    fn insert_new(&mut self, key: String, value: V) {
        if !self.make_room() {
            return;
        }
        if self.max_entries.is_some() {
            self.order.push_back(key.clone());
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Live entry lookup; drops the entry if it has expired.
    fn live(&mut self, key: &str) -> bool {
        let expired = match self.entries.get(key) {
            Some(entry) => self.is_expired(entry),
            None => return false,
        };
        if expired {
            self.remove(key);
            return false;
        }
        true
    }
}

impl<V: Clone> MemoCache<V> {
    /// Create a cache. `None` for both arguments means unbounded memoization.
    pub fn new(max_entries: Option<usize>, ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                max_entries,
                ttl,
            }),
        }
    }

    /// Unbounded cache without expiry.
    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    /// Build a cache from a configured policy.
    pub fn from_policy(policy: &CachePolicy) -> Self {
        Self::new(policy.max_entries, policy.ttl_secs.map(Duration::from_secs))
    }

    /// Get a cached value. Returns None on miss or expired entry.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        if !inner.live(key) {
            return None;
        }
        inner.touch(key);
        inner.entries.get(key).map(|e| e.value.clone())
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().live(key)
    }

    /// Insert or replace a value.
    pub fn put(&self, key: String, value: V) {
        let mut inner = self.inner.lock();
        if inner.entries.contains_key(&key) {
            inner.remove(&key);
        }
        inner.insert_new(key, value);
    }

    /// Insert unless a live entry already exists; returns the stored value.
    ///
    /// The check and the insert happen under one lock acquisition, so
    /// concurrent writers for the same key agree on the first value.
    pub fn insert_if_absent(&self, key: String, value: V) -> V {
        let mut inner = self.inner.lock();
        if inner.live(&key) {
            inner.touch(&key);
            if let Some(existing) = inner.entries.get(&key) {
                return existing.value.clone();
            }
        }
        inner.insert_new(key, value.clone());
        value
    }

    /// Number of entries in the cache, expired ones included until read.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

impl<V: Clone> Default for MemoCache<V> {
    fn default() -> Self {
        Self::unbounded()
    }
}
