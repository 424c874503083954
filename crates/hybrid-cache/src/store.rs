//! Two-tier storage: a bounded LRU memory tier backed by an unbounded
//! local tier that only loses entries via expiry or an explicit clear.

use crate::types::{full_key, StoredValue};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Instant;

pub(crate) struct TieredStore {
    memory: LruCache<String, StoredValue>,
    local: HashMap<String, StoredValue>,
}

pub(crate) enum Lookup {
    MemoryHit(StoredValue),
    PromotedFromLocal(StoredValue),
    Miss,
}

impl TieredStore {
    pub(crate) fn new(max_memory_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_memory_entries.max(1)).expect("nonzero");
        Self {
            memory: LruCache::new(capacity),
            local: HashMap::new(),
        }
    }

    /// Looks up `key`, promoting a local-tier hit into memory and lazily
    /// evicting an expired entry wherever it's found.
    pub(crate) fn get(&mut self, key: &str, now: Instant) -> Lookup {
        if let Some(entry) = self.memory.get(key) {
            if entry.is_expired(now) {
                self.memory.pop(key);
                self.local.remove(key);
                return Lookup::Miss;
            }
            let mut entry = entry.clone();
            entry.last_access = now;
            let result = entry.clone();
            self.memory.put(key.to_string(), entry);
            return Lookup::MemoryHit(result);
        }

        if let Some(entry) = self.local.get(key) {
            if entry.is_expired(now) {
                self.local.remove(key);
                return Lookup::Miss;
            }
            let mut promoted = entry.clone();
            promoted.last_access = now;
            self.memory.put(key.to_string(), promoted.clone());
            return Lookup::PromotedFromLocal(promoted);
        }

        Lookup::Miss
    }

    /// Returns the prior value, if any, without touching recency (used to
    /// decide `create` vs `update` and to compute `old_checksum`).
    pub(crate) fn peek(&self, key: &str) -> Option<&StoredValue> {
        self.local.get(key).or_else(|| self.memory.peek(key))
    }

    /// Writes both tiers, returning an entry the memory tier evicted to
    /// make room (the local tier is never evicted on write).
    pub(crate) fn set(&mut self, key: String, value: StoredValue) -> Option<(String, StoredValue)> {
        self.local.insert(key.clone(), value.clone());
        let evicted = if self.memory.len() >= self.memory.cap().get() && !self.memory.contains(&key)
        {
            self.memory.pop_lru()
        } else {
            None
        };
        self.memory.put(key, value);
        evicted
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<StoredValue> {
        self.memory.pop(key);
        self.local.remove(key)
    }

    pub(crate) fn clear_namespace(&mut self, namespace: &str) -> usize {
        let prefix = format!("{namespace}:");
        let keys: Vec<String> = self
            .local
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();
        for key in &keys {
            self.memory.pop(key);
            self.local.remove(key);
        }
        keys.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.local.len()
    }
}

#[allow(dead_code)]
pub(crate) fn key_for(namespace: &str, key: &str) -> String {
    full_key(namespace, key)
}
