//! Two-tier namespaced cache with tag invalidation and delta tracking.
//!
//! Unlike the Tower middleware patterns in the sibling resilience crates,
//! the cache is consulted directly by the orchestrator rather than wrapped
//! around a downstream [`tower::Service`]: callers address entries by an
//! explicit `(namespace, key)` pair instead of deriving a key from a
//! request type, and every write additionally produces a [`CacheDelta`]
//! the sync layer later drains.
//!
//! # Tiers
//!
//! A bounded LRU memory tier sits in front of an unbounded local tier.
//! `get` checks memory first, falls back to local on a miss and promotes
//! the entry back into memory; only the memory tier ever evicts on
//! capacity pressure, the local tier survives until `clear_namespace` or
//! TTL expiry removes it.
//!
//! # Examples
//!
//! ```
//! use hybrid_cache::Cache;
//! use serde_json::json;
//!
//! let cache = Cache::new(hybrid_cache::CacheConfig::default());
//! cache.set("products", "sku-1", json!({"price": 9.99}), None, &[]);
//! let (value, hit) = cache.get("products", "sku-1");
//! assert!(hit);
//! assert_eq!(value.unwrap(), json!({"price": 9.99}));
//! ```

mod config;
mod events;
mod store;
mod types;

pub use config::{CacheConfig, CacheConfigBuilder, WriteStrategy};
pub use events::CacheEvent;
pub use types::{CacheConflict, CacheDelta, DeltaOp};

use hybrid_resilience_core::EventListeners;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::{Lookup, TieredStore};
use types::{checksum_of, full_key, StoredValue};

/// Point-in-time counters for [`Cache::get_metrics`].
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub conflicts_detected: u64,
    pub entries: usize,
    pub pending_deltas: usize,
}

struct CacheState {
    store: TieredStore,
    tag_index: HashMap<String, HashSet<String>>,
    deltas: Vec<CacheDelta>,
    next_seq: u64,
    /// Last backend checksum observed per key, used by `detect_conflicts`
    /// to tell a genuine remote change from our own unsynced write.
    last_seen_backend_checksum: HashMap<String, String>,
}

/// Two-tier cache: memory (LRU, bounded) + local (unbounded besides
/// expiry/clear), with tag-based invalidation and delta tracking for the
/// sync layer.
pub struct Cache {
    config: Arc<CacheConfig>,
    state: RwLock<CacheState>,
    namespace_ttls: RwLock<HashMap<String, Duration>>,
    event_listeners: EventListeners<CacheEvent>,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
    conflicts_detected: AtomicU64,
}

impl Cache {
    pub fn new(config: CacheConfig) -> Self {
        let max_memory_entries = config.max_memory_entries;
        Self {
            config: Arc::new(config),
            state: RwLock::new(CacheState {
                store: TieredStore::new(max_memory_entries),
                tag_index: HashMap::new(),
                deltas: Vec::new(),
                next_seq: 0,
                last_seen_backend_checksum: HashMap::new(),
            }),
            namespace_ttls: RwLock::new(HashMap::new()),
            event_listeners: EventListeners::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            conflicts_detected: AtomicU64::new(0),
        }
    }

    pub fn with_event_listeners(mut self, listeners: EventListeners<CacheEvent>) -> Self {
        self.event_listeners = listeners;
        self
    }

    /// Overrides the default TTL for every entry written to `namespace`
    /// afterwards, absent an explicit `ttl` argument to [`Cache::set`].
    pub fn set_namespace_ttl(&self, namespace: &str, ttl: Duration) {
        self.namespace_ttls.write().insert(namespace.to_string(), ttl);
    }

    fn resolve_ttl(&self, namespace: &str, ttl: Option<Duration>) -> Option<Duration> {
        ttl.or_else(|| self.namespace_ttls.read().get(namespace).copied())
            .or(self.config.default_ttl)
    }

    /// Looks up `key` in `namespace`. Returns `(value, hit)`; `hit` is
    /// `false` on a miss or lazily-evicted expired entry.
    pub fn get(&self, namespace: &str, key: &str) -> (Option<serde_json::Value>, bool) {
        let full = full_key(namespace, key);
        let now = Instant::now();
        let mut state = self.state.write();

        match state.store.get(&full, now) {
            Lookup::MemoryHit(entry) | Lookup::PromotedFromLocal(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                self.event_listeners.emit(&CacheEvent::Hit {
                    pattern_name: self.config.name.clone(),
                    timestamp: now,
                    namespace: namespace.to_string(),
                    key: key.to_string(),
                });
                (Some(entry.value), true)
            }
            Lookup::Miss => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.event_listeners.emit(&CacheEvent::Miss {
                    pattern_name: self.config.name.clone(),
                    timestamp: now,
                    namespace: namespace.to_string(),
                    key: key.to_string(),
                });
                (None, false)
            }
        }
    }

    /// Stores `value` under `(namespace, key)`, tagging it for later
    /// `invalidate_by_tag` calls and appending a delta (`create` if no
    /// prior entry existed, `update` otherwise). If the configured write
    /// strategy is write-through, the delta is created at `Immediate`
    /// priority-equivalent (drained first by `get_deltas_for_sync` since
    /// it is always the newest); write-back leaves ordinary batching.
    pub fn set(
        &self,
        namespace: &str,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
        tags: &[String],
    ) {
        let full = full_key(namespace, key);
        let now = Instant::now();
        let checksum = checksum_of(&value);
        let ttl = self.resolve_ttl(namespace, ttl);

        let mut state = self.state.write();
        let old_checksum = state.store.peek(&full).map(|e| e.checksum.clone());

        for tag in tags {
            state
                .tag_index
                .entry(tag.clone())
                .or_default()
                .insert(full.clone());
        }

        let entry = StoredValue {
            value,
            checksum: checksum.clone(),
            tags: tags.to_vec(),
            inserted_at: now,
            last_access: now,
            ttl,
        };

        if let Some((evicted_key, _)) = state.store.set(full.clone(), entry) {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            self.event_listeners.emit(&CacheEvent::Eviction {
                pattern_name: self.config.name.clone(),
                timestamp: now,
                namespace: namespace.to_string(),
                key: evicted_key,
            });
        }

        let operation = if old_checksum.is_some() {
            types::DeltaOp::Update
        } else {
            types::DeltaOp::Create
        };
        record_delta(
            &mut state,
            &self.config,
            namespace,
            key,
            operation,
            old_checksum,
            Some(checksum),
        );

        self.sets.fetch_add(1, Ordering::Relaxed);
        self.event_listeners.emit(&CacheEvent::Set {
            pattern_name: self.config.name.clone(),
            timestamp: now,
            namespace: namespace.to_string(),
            key: key.to_string(),
        });
    }

    /// Removes `(namespace, key)` from both tiers, appending a `delete`
    /// delta if an entry existed.
    pub fn delete(&self, namespace: &str, key: &str) {
        let full = full_key(namespace, key);
        let now = Instant::now();
        let mut state = self.state.write();

        let Some(removed) = state.store.remove(&full) else {
            return;
        };
        for tag in &removed.tags {
            if let Some(keys) = state.tag_index.get_mut(tag) {
                keys.remove(&full);
            }
        }

        record_delta(
            &mut state,
            &self.config,
            namespace,
            key,
            types::DeltaOp::Delete,
            Some(removed.checksum),
            None,
        );

        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.event_listeners.emit(&CacheEvent::Delete {
            pattern_name: self.config.name.clone(),
            timestamp: now,
            namespace: namespace.to_string(),
            key: key.to_string(),
        });
    }

    /// Removes every key tagged `tag`, appending a `delete` delta per key.
    /// Returns the number of keys invalidated.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        let now = Instant::now();
        let mut state = self.state.write();
        let Some(keys) = state.tag_index.remove(tag) else {
            return 0;
        };

        let count = keys.len();
        for full in keys {
            let Some((namespace, key)) = split_full_key(&full) else {
                continue;
            };
            if let Some(removed) = state.store.remove(&full) {
                record_delta(
                    &mut state,
                    &self.config,
                    &namespace,
                    &key,
                    types::DeltaOp::Delete,
                    Some(removed.checksum),
                    None,
                );
            }
        }

        self.event_listeners.emit(&CacheEvent::TagInvalidated {
            pattern_name: self.config.name.clone(),
            timestamp: now,
            tag: tag.to_string(),
            count,
        });
        count
    }

    /// Bulk-populates entries without producing sync deltas: the data is
    /// assumed to already be authoritative (e.g. freshly pulled from the
    /// backend), so nothing needs to flow back to the sync layer.
    pub fn warm(&self, namespace: &str, entries: Vec<(String, serde_json::Value)>) {
        let now = Instant::now();
        let ttl = self.resolve_ttl(namespace, None);
        let mut state = self.state.write();
        for (key, value) in entries {
            let full = full_key(namespace, &key);
            let checksum = checksum_of(&value);
            state.store.set(
                full,
                StoredValue {
                    value,
                    checksum,
                    tags: vec![],
                    inserted_at: now,
                    last_access: now,
                    ttl,
                },
            );
        }
    }

    /// Removes every entry in `namespace` from both tiers without emitting
    /// deltas (a namespace clear is a local housekeeping operation, not an
    /// entity mutation the backend needs to know about).
    pub fn clear_namespace(&self, namespace: &str) -> usize {
        let now = Instant::now();
        let mut state = self.state.write();
        let count = state.store.clear_namespace(namespace);
        state
            .tag_index
            .retain(|_, keys| {
                keys.retain(|k| !k.starts_with(&format!("{namespace}:")));
                !keys.is_empty()
            });

        self.event_listeners.emit(&CacheEvent::NamespaceCleared {
            pattern_name: self.config.name.clone(),
            timestamp: now,
            namespace: namespace.to_string(),
            count,
        });
        count
    }

    /// Returns pending deltas ready for the sync layer, collapsing any run
    /// of unsynced deltas that share a key: consecutive `create`+`update`
    /// collapses to a single `create` carrying the final checksum; a
    /// `create` followed by a `delete` cancels out entirely (the entity
    /// never existed on the backend); anything else ending in `delete`
    /// collapses to a single `delete` carrying the original checksum.
    /// Deltas themselves are never rewritten by this call; only the
    /// projection returned here is collapsed.
    pub fn get_deltas_for_sync(&self, limit: Option<usize>) -> Vec<CacheDelta> {
        let state = self.state.read();
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&CacheDelta>> = HashMap::new();

        for delta in state.deltas.iter().filter(|d| !d.synced) {
            let full = delta.full_key();
            if !groups.contains_key(&full) {
                order.push(full.clone());
            }
            groups.entry(full).or_default().push(delta);
        }

        let mut out = Vec::new();
        for full in order {
            let chain = &groups[&full];
            if let Some(collapsed) = collapse_chain(chain) {
                out.push(collapsed);
            }
        }
        out.sort_by_key(|d| d.seq);
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        out
    }

    /// Marks every underlying delta covered by `delta_id` (i.e. every
    /// delta for the same key up to and including that sequence number)
    /// as synced.
    pub fn mark_deltas_synced(&self, delta_ids: &[String]) {
        let mut state = self.state.write();
        let mut cutoffs: HashMap<String, u64> = HashMap::new();
        for d in &state.deltas {
            if delta_ids.contains(&d.delta_id) {
                cutoffs
                    .entry(d.full_key())
                    .and_modify(|s| *s = (*s).max(d.seq))
                    .or_insert(d.seq);
            }
        }
        for d in state.deltas.iter_mut() {
            if let Some(&cutoff) = cutoffs.get(&d.full_key()) {
                if d.seq <= cutoff {
                    d.synced = true;
                }
            }
        }
        prune_deltas(&mut state, &self.config);
    }

    /// Compares held checksums against `backend_checksums` (typically
    /// obtained from `hybrid_sync::SyncLayer::backend_checksums`), keyed
    /// by `"namespace:key"`. A mismatch only counts as a conflict once we
    /// have previously observed a *different* backend checksum for that
    /// key; the first observation just establishes the baseline, so a
    /// key's own unsynced local write never conflicts with itself.
    pub fn detect_conflicts(
        &self,
        backend_checksums: &HashMap<String, String>,
    ) -> Vec<CacheConflict> {
        let now = Instant::now();
        let mut state = self.state.write();
        let mut conflicts = Vec::new();

        for (full, backend_checksum) in backend_checksums {
            let local = state.store.peek(full).map(|e| e.checksum.clone());
            if let Some(local_checksum) = local {
                if &local_checksum != backend_checksum {
                    let previously_different = state
                        .last_seen_backend_checksum
                        .get(full)
                        .map(|prev| prev != backend_checksum)
                        .unwrap_or(false);

                    if previously_different {
                        if let Some((namespace, key)) = split_full_key(full) {
                            self.conflicts_detected.fetch_add(1, Ordering::Relaxed);
                            self.event_listeners.emit(&CacheEvent::ConflictDetected {
                                pattern_name: self.config.name.clone(),
                                timestamp: now,
                                namespace: namespace.clone(),
                                key: key.clone(),
                            });
                            conflicts.push(CacheConflict {
                                namespace,
                                key,
                                local_checksum,
                                backend_checksum: backend_checksum.clone(),
                            });
                        }
                    }
                }
            }
            state
                .last_seen_backend_checksum
                .insert(full.clone(), backend_checksum.clone());
        }

        conflicts
    }

    pub fn len(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_metrics(&self) -> CacheMetrics {
        let state = self.state.read();
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            conflicts_detected: self.conflicts_detected.load(Ordering::Relaxed),
            entries: state.store.len(),
            pending_deltas: state.deltas.iter().filter(|d| !d.synced).count(),
        }
    }
}

fn record_delta(
    state: &mut CacheState,
    config: &CacheConfig,
    namespace: &str,
    key: &str,
    operation: types::DeltaOp,
    old_checksum: Option<String>,
    new_checksum: Option<String>,
) {
    state.next_seq += 1;
    let seq = state.next_seq;
    state.deltas.push(CacheDelta {
        delta_id: format!("{namespace}:{key}#{seq}"),
        namespace: namespace.to_string(),
        key: key.to_string(),
        operation,
        old_checksum,
        new_checksum,
        synced: false,
        seq,
    });
    prune_deltas(state, config);
}

fn prune_deltas(state: &mut CacheState, config: &CacheConfig) {
    if state.deltas.len() <= config.max_pending_deltas {
        return;
    }
    state.deltas.retain(|d| !d.synced);
    if state.deltas.len() > config.retained_unsynced_deltas {
        state.deltas.sort_by_key(|d| d.seq);
        let cut = state.deltas.len() - config.retained_unsynced_deltas;
        state.deltas.drain(0..cut);
    }
}

/// Collapses one key's ordered chain of unsynced deltas into at most one
/// delta, per the rules documented on [`Cache::get_deltas_for_sync`].
fn collapse_chain(chain: &[&CacheDelta]) -> Option<CacheDelta> {
    let first = chain.first()?;
    let last = chain.last()?;

    let started_with_create = first.operation == types::DeltaOp::Create;
    let ended_with_delete = last.operation == types::DeltaOp::Delete;

    if started_with_create && ended_with_delete {
        return None;
    }

    let (operation, old_checksum, new_checksum) = if ended_with_delete {
        (types::DeltaOp::Delete, first.old_checksum.clone(), None)
    } else if started_with_create {
        (types::DeltaOp::Create, None, last.new_checksum.clone())
    } else {
        (
            types::DeltaOp::Update,
            first.old_checksum.clone(),
            last.new_checksum.clone(),
        )
    };

    Some(CacheDelta {
        delta_id: last.delta_id.clone(),
        namespace: last.namespace.clone(),
        key: last.key.clone(),
        operation,
        old_checksum,
        new_checksum,
        synced: false,
        seq: last.seq,
    })
}

fn split_full_key(full: &str) -> Option<(String, String)> {
    full.split_once(':')
        .map(|(ns, k)| (ns.to_string(), k.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache() -> Cache {
        Cache::new(CacheConfig::builder().max_memory_entries(2).build())
    }

    #[test]
    fn set_then_get_is_a_hit() {
        let cache = cache();
        cache.set("ns", "a", json!(1), None, &[]);
        let (value, hit) = cache.get("ns", "a");
        assert!(hit);
        assert_eq!(value, Some(json!(1)));
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache = cache();
        let (value, hit) = cache.get("ns", "missing");
        assert!(!hit);
        assert_eq!(value, None);
    }

    #[test]
    fn namespaces_are_isolated() {
        let cache = cache();
        cache.set("a", "k", json!(1), None, &[]);
        let (value, hit) = cache.get("b", "k");
        assert!(!hit);
        assert_eq!(value, None);
    }

    #[test]
    fn ttl_expiration_causes_miss() {
        let cache = Cache::new(
            CacheConfig::builder()
                .default_ttl(Duration::from_millis(0))
                .build(),
        );
        cache.set("ns", "a", json!(1), Some(Duration::from_millis(0)), &[]);
        std::thread::sleep(Duration::from_millis(5));
        let (value, hit) = cache.get("ns", "a");
        assert!(!hit);
        assert_eq!(value, None);
    }

    #[test]
    fn invalidate_by_tag_removes_every_tagged_key() {
        let cache = cache();
        cache.set("ns", "a", json!(1), None, &["featured".to_string()]);
        cache.set("ns", "b", json!(2), None, &["featured".to_string()]);
        cache.set("ns", "c", json!(3), None, &[]);

        let count = cache.invalidate_by_tag("featured");
        assert_eq!(count, 2);
        assert!(!cache.get("ns", "a").1);
        assert!(!cache.get("ns", "b").1);
        assert!(cache.get("ns", "c").1);
    }

    #[test]
    fn clear_namespace_leaves_other_namespaces_intact() {
        let cache = cache();
        cache.set("a", "k", json!(1), None, &[]);
        cache.set("b", "k", json!(2), None, &[]);
        let removed = cache.clear_namespace("a");
        assert_eq!(removed, 1);
        assert!(!cache.get("a", "k").1);
        assert!(cache.get("b", "k").1);
    }

    #[test]
    fn delete_then_get_is_a_miss() {
        let cache = cache();
        cache.set("ns", "a", json!(1), None, &[]);
        cache.delete("ns", "a");
        assert!(!cache.get("ns", "a").1);
    }

    #[test]
    fn create_then_update_collapses_to_single_create() {
        let cache = cache();
        cache.set("ns", "a", json!(1), None, &[]);
        cache.set("ns", "a", json!(2), None, &[]);

        let deltas = cache.get_deltas_for_sync(None);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].operation, DeltaOp::Create);
        assert!(deltas[0].old_checksum.is_none());
    }

    #[test]
    fn create_then_delete_cancels_out() {
        let cache = cache();
        cache.set("ns", "a", json!(1), None, &[]);
        cache.delete("ns", "a");

        let deltas = cache.get_deltas_for_sync(None);
        assert!(deltas.is_empty());
    }

    #[test]
    fn mark_deltas_synced_removes_them_from_the_pending_set() {
        let cache = cache();
        cache.set("ns", "a", json!(1), None, &[]);
        let deltas = cache.get_deltas_for_sync(None);
        assert_eq!(deltas.len(), 1);

        cache.mark_deltas_synced(&[deltas[0].delta_id.clone()]);
        assert!(cache.get_deltas_for_sync(None).is_empty());
    }

    #[test]
    fn detect_conflicts_ignores_first_observation() {
        let cache = cache();
        cache.set("ns", "a", json!(1), None, &[]);

        let mut backend = HashMap::new();
        backend.insert("ns:a".to_string(), "some-other-checksum".to_string());
        let conflicts = cache.detect_conflicts(&backend);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn detect_conflicts_flags_a_second_diverging_checksum() {
        let cache = cache();
        cache.set("ns", "a", json!(1), None, &[]);

        let mut backend = HashMap::new();
        backend.insert("ns:a".to_string(), "checksum-v1".to_string());
        cache.detect_conflicts(&backend);

        backend.insert("ns:a".to_string(), "checksum-v2".to_string());
        let conflicts = cache.detect_conflicts(&backend);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].key, "a");
    }

    #[test]
    fn namespace_ttl_override_applies_without_an_explicit_ttl() {
        let cache = Cache::new(CacheConfig::builder().default_ttl(Duration::from_secs(300)).build());
        cache.set_namespace_ttl("flash", Duration::from_millis(0));
        cache.set("flash", "a", json!(1), None, &[]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(!cache.get("flash", "a").1, "namespace override should have expired the entry");
    }

    #[test]
    fn memory_eviction_is_counted_but_local_tier_keeps_serving() {
        let cache = cache();
        cache.set("ns", "a", json!(1), None, &[]);
        cache.set("ns", "b", json!(2), None, &[]);
        cache.set("ns", "c", json!(3), None, &[]);

        assert_eq!(cache.get_metrics().evictions, 1);
        assert!(cache.get("ns", "a").1, "local tier still has the evicted key");
    }
}
