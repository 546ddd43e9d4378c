use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Slot<V> {
    value: V,
    inserted: Instant,
    /// Key of this entry in `order`.
    stamp: u64,
}

/// Outcome of a cache read.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Lookup<V> {
    Hit(V),
    Miss,
    /// The entry existed but outlived the TTL and was removed.
    Expired,
}

/// Capacity-bounded LRU map with an optional absolute age limit.
///
/// Recency is a monotonically increasing stamp per entry, indexed in a `BTreeMap` (first = least
/// recent), so hits, inserts and evictions are `O(log n)`. Expiry is checked lazily on read and
/// swept on write.
pub(crate) struct LruTtlCache<K, V> {
    map: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    next_stamp: u64,
    capacity: usize,
    ttl: Option<Duration>,
}

impl<K: Clone + Eq + Hash, V: Clone> LruTtlCache<K, V> {
    pub(crate) fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            map: HashMap::new(),
            order: BTreeMap::new(),
            next_stamp: 0,
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn get(&mut self, key: &K, now: Instant) -> Lookup<V> {
        let Some(slot) = self.map.get(key) else {
            return Lookup::Miss;
        };
        if self.is_expired(slot.inserted, now) {
            self.remove(key);
            return Lookup::Expired;
        }
        let value = slot.value.clone();
        self.touch(key);
        Lookup::Hit(value)
    }

    /// Non-mutating read: no recency bump, expired entries read as absent.
    pub(crate) fn peek(&self, key: &K, now: Instant) -> Option<V> {
        self.map
            .get(key)
            .filter(|s| !self.is_expired(s.inserted, now))
            .map(|s| s.value.clone())
    }

    /// Insert and return `(evicted, expired)` counts.
    pub(crate) fn insert(&mut self, key: K, value: V, now: Instant) -> (u64, u64) {
        let expired = self.sweep_expired(now);
        let stamp = self.bump();
        if let Some(old) = self.map.insert(
            key.clone(),
            Slot {
                value,
                inserted: now,
                stamp,
            },
        ) {
            self.order.remove(&old.stamp);
        }
        self.order.insert(stamp, key);

        let mut evicted = 0u64;
        while self.map.len() > self.capacity {
            let Some((_, old)) = self.order.pop_first() else {
                break;
            };
            self.map.remove(&old);
            evicted += 1;
        }
        (evicted, expired)
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.map.remove(key)?;
        self.order.remove(&slot.stamp);
        Some(slot.value)
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn bump(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    fn touch(&mut self, key: &K) {
        let stamp = self.bump();
        if let Some(slot) = self.map.get_mut(key) {
            let old = std::mem::replace(&mut slot.stamp, stamp);
            if let Some(k) = self.order.remove(&old) {
                self.order.insert(stamp, k);
            }
        }
    }

    fn is_expired(&self, inserted: Instant, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(inserted) >= ttl)
    }

    fn sweep_expired(&mut self, now: Instant) -> u64 {
        if self.ttl.is_none() {
            return 0;
        }
        let stale: Vec<K> = self
            .map
            .iter()
            .filter(|(_, s)| self.is_expired(s.inserted, now))
            .map(|(k, _)| k.clone())
            .collect();
        for k in &stale {
            self.remove(k);
        }
        stale.len() as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/lru.rs"]
mod tests;
