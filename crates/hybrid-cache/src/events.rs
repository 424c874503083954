//! Events emitted by the cache.

use hybrid_resilience_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by the cache.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    Hit {
        pattern_name: String,
        timestamp: Instant,
        namespace: String,
        key: String,
    },
    Miss {
        pattern_name: String,
        timestamp: Instant,
        namespace: String,
        key: String,
    },
    Set {
        pattern_name: String,
        timestamp: Instant,
        namespace: String,
        key: String,
    },
    Delete {
        pattern_name: String,
        timestamp: Instant,
        namespace: String,
        key: String,
    },
    Eviction {
        pattern_name: String,
        timestamp: Instant,
        namespace: String,
        key: String,
    },
    TagInvalidated {
        pattern_name: String,
        timestamp: Instant,
        tag: String,
        count: usize,
    },
    NamespaceCleared {
        pattern_name: String,
        timestamp: Instant,
        namespace: String,
        count: usize,
    },
    ConflictDetected {
        pattern_name: String,
        timestamp: Instant,
        namespace: String,
        key: String,
    },
}

impl ResilienceEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::Set { .. } => "set",
            CacheEvent::Delete { .. } => "delete",
            CacheEvent::Eviction { .. } => "eviction",
            CacheEvent::TagInvalidated { .. } => "tag_invalidated",
            CacheEvent::NamespaceCleared { .. } => "namespace_cleared",
            CacheEvent::ConflictDetected { .. } => "conflict_detected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::Set { timestamp, .. }
            | CacheEvent::Delete { timestamp, .. }
            | CacheEvent::Eviction { timestamp, .. }
            | CacheEvent::TagInvalidated { timestamp, .. }
            | CacheEvent::NamespaceCleared { timestamp, .. }
            | CacheEvent::ConflictDetected { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            CacheEvent::Hit { pattern_name, .. }
            | CacheEvent::Miss { pattern_name, .. }
            | CacheEvent::Set { pattern_name, .. }
            | CacheEvent::Delete { pattern_name, .. }
            | CacheEvent::Eviction { pattern_name, .. }
            | CacheEvent::TagInvalidated { pattern_name, .. }
            | CacheEvent::NamespaceCleared { pattern_name, .. }
            | CacheEvent::ConflictDetected { pattern_name, .. } => pattern_name,
        }
    }
}
