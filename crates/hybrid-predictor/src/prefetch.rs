use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub(crate) struct PrefetchEntry {
    pub(crate) confidence: f64,
    pub(crate) inserted_at: Instant,
    pub(crate) expires_at: Instant,
    pub(crate) used: bool,
}

/// Bounded set of keys the predictor believes are worth warming in the
/// cache. Capacity-limited; eviction prefers unused, lowest-confidence,
/// oldest entries.
#[derive(Debug, Default)]
pub(crate) struct PrefetchSlot {
    entries: HashMap<String, PrefetchEntry>,
}

impl PrefetchSlot {
    /// Inserts `key` with the given confidence and TTL, evicting to make
    /// room if the slot is at capacity. Returns `true` if the key is new.
    pub(crate) fn insert(
        &mut self,
        key: String,
        confidence: f64,
        ttl: Duration,
        max_items: usize,
        now: Instant,
    ) -> bool {
        self.evict_expired(now);

        let is_new = !self.entries.contains_key(&key);

        if is_new && self.entries.len() >= max_items {
            self.evict_one();
        }

        self.entries.insert(
            key,
            PrefetchEntry {
                confidence,
                inserted_at: now,
                expires_at: now + ttl,
                used: false,
            },
        );

        is_new
    }

    fn evict_expired(&mut self, now: Instant) {
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Evicts the entry least worth keeping: unused first, then lowest
    /// confidence, then oldest.
    fn evict_one(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by(|(_, a), (_, b)| {
                a.used
                    .cmp(&b.used)
                    .then_with(|| {
                        a.confidence
                            .partial_cmp(&b.confidence)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .then_with(|| a.inserted_at.cmp(&b.inserted_at))
            })
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }

    pub(crate) fn mark_used(&mut self, key: &str) -> bool {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.used = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
