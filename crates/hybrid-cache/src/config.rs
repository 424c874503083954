//! Configuration for the cache.

use crate::events::CacheEvent;
use hybrid_resilience_core::{EventListeners, FnListener};
use std::time::Duration;

/// When a write should propagate to the sync layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    /// Deltas accumulate for the next `get_deltas_for_sync` drain.
    WriteBack,
    /// Every `set` also emits an immediate-priority delta ready for sync
    /// on the very next drain, bypassing normal batching.
    WriteThrough,
}

/// Configuration for the [`Cache`](crate::Cache).
#[derive(Clone)]
pub struct CacheConfig {
    pub(crate) name: String,
    /// Bound on the memory tier; the local tier is unbounded (besides
    /// namespace clears and expiry).
    pub(crate) max_memory_entries: usize,
    pub(crate) default_ttl: Option<Duration>,
    pub(crate) write_strategy: WriteStrategy,
    /// Pending-delta high-water mark that triggers pruning.
    pub(crate) max_pending_deltas: usize,
    /// Unsynced deltas retained per key when pruning at the high-water mark.
    pub(crate) retained_unsynced_deltas: usize,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    pub fn write_strategy(&self) -> WriteStrategy {
        self.write_strategy
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfigBuilder::new().build()
    }
}

/// Builder for [`CacheConfig`].
pub struct CacheConfigBuilder {
    name: String,
    max_memory_entries: usize,
    default_ttl: Option<Duration>,
    write_strategy: WriteStrategy,
    max_pending_deltas: usize,
    retained_unsynced_deltas: usize,
    event_listeners: EventListeners<CacheEvent>,
}

impl CacheConfigBuilder {
    pub fn new() -> Self {
        Self {
            name: "cache".to_string(),
            max_memory_entries: 10_000,
            default_ttl: Some(Duration::from_secs(300)),
            write_strategy: WriteStrategy::WriteBack,
            max_pending_deltas: 10_000,
            retained_unsynced_deltas: 5_000,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn max_memory_entries(mut self, max: usize) -> Self {
        self.max_memory_entries = max;
        self
    }

    /// Default TTL applied to `set` calls that don't pass an explicit one.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn no_default_ttl(mut self) -> Self {
        self.default_ttl = None;
        self
    }

    pub fn write_strategy(mut self, strategy: WriteStrategy) -> Self {
        self.write_strategy = strategy;
        self
    }

    pub fn max_pending_deltas(mut self, max: usize) -> Self {
        self.max_pending_deltas = max;
        self
    }

    pub fn retained_unsynced_deltas(mut self, n: usize) -> Self {
        self.retained_unsynced_deltas = n;
        self
    }

    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(listener));
        self
    }

    pub fn build(self) -> CacheConfig {
        CacheConfig {
            name: self.name,
            max_memory_entries: self.max_memory_entries,
            default_ttl: self.default_ttl,
            write_strategy: self.write_strategy,
            max_pending_deltas: self.max_pending_deltas,
            retained_unsynced_deltas: self.retained_unsynced_deltas,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
