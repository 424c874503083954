use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Hashes `(field_name, value, rules)` into a single cache key. Values are
/// hashed, not stored verbatim, so the cache never retains raw input.
pub(crate) fn cache_key(field_name: &str, value: &str, rules_signature: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    field_name.hash(&mut hasher);
    value.hash(&mut hasher);
    rules_signature.hash(&mut hasher);
    hasher.finish()
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    last_access: Instant,
}

/// TTL-bounded, LRU-pruned cache for validation results.
pub(crate) struct ValidationCache<V> {
    entries: HashMap<u64, CacheEntry<V>>,
    ttl: Duration,
    max_size: usize,
}

impl<V: Clone> ValidationCache<V> {
    pub(crate) fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_size,
        }
    }

    pub(crate) fn get(&mut self, key: u64, now: Instant) -> Option<V> {
        if let Some(entry) = self.entries.get_mut(&key) {
            if now.duration_since(entry.inserted_at) > self.ttl {
                self.entries.remove(&key);
                return None;
            }
            entry.last_access = now;
            return Some(entry.value.clone());
        }
        None
    }

    pub(crate) fn insert(&mut self, key: u64, value: V, now: Instant) {
        if self.entries.len() >= self.max_size && !self.entries.contains_key(&key) {
            self.prune_oldest();
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                last_access: now,
            },
        );
    }

    fn prune_oldest(&mut self) {
        if let Some(victim) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| *key)
        {
            self.entries.remove(&victim);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_returns_same_value() {
        let mut cache = ValidationCache::new(Duration::from_secs(60), 10);
        let now = Instant::now();
        cache.insert(1, "result".to_string(), now);
        assert_eq!(cache.get(1, now), Some("result".to_string()));
    }

    #[test]
    fn expired_entry_is_evicted_on_access() {
        let mut cache = ValidationCache::new(Duration::from_millis(10), 10);
        let now = Instant::now();
        cache.insert(1, "result".to_string(), now);
        let later = now + Duration::from_millis(50);
        assert_eq!(cache.get(1, later), None);
    }

    #[test]
    fn prunes_least_recently_used_entry_when_full() {
        let mut cache = ValidationCache::new(Duration::from_secs(60), 2);
        let t0 = Instant::now();
        cache.insert(1, "a".to_string(), t0);
        let t1 = t0 + Duration::from_millis(1);
        cache.insert(2, "b".to_string(), t1);

        let t2 = t1 + Duration::from_millis(1);
        cache.insert(3, "c".to_string(), t2);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1, t2), None);
    }
}
