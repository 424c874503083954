//! Event types for the sync layer.

use hybrid_resilience_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by the sync layer.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A push round completed.
    Pushed {
        pattern_name: String,
        timestamp: Instant,
        delta_count: usize,
        success: bool,
    },
    /// A pull round completed.
    Pulled {
        pattern_name: String,
        timestamp: Instant,
        delta_count: usize,
        success: bool,
    },
    /// A conflict was detected during a pull.
    ConflictDetected {
        pattern_name: String,
        timestamp: Instant,
        entity_key: String,
    },
    /// A conflict was resolved.
    ConflictResolved {
        pattern_name: String,
        timestamp: Instant,
        entity_key: String,
        resolution: &'static str,
    },
    /// A delta was dropped from the offline queue due to overflow.
    DeltaDropped {
        pattern_name: String,
        timestamp: Instant,
        entity_key: String,
    },
}

impl ResilienceEvent for SyncEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::Pushed { .. } => "pushed",
            SyncEvent::Pulled { .. } => "pulled",
            SyncEvent::ConflictDetected { .. } => "conflict_detected",
            SyncEvent::ConflictResolved { .. } => "conflict_resolved",
            SyncEvent::DeltaDropped { .. } => "delta_dropped",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            SyncEvent::Pushed { timestamp, .. }
            | SyncEvent::Pulled { timestamp, .. }
            | SyncEvent::ConflictDetected { timestamp, .. }
            | SyncEvent::ConflictResolved { timestamp, .. }
            | SyncEvent::DeltaDropped { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            SyncEvent::Pushed { pattern_name, .. }
            | SyncEvent::Pulled { pattern_name, .. }
            | SyncEvent::ConflictDetected { pattern_name, .. }
            | SyncEvent::ConflictResolved { pattern_name, .. }
            | SyncEvent::DeltaDropped { pattern_name, .. } => pattern_name,
        }
    }
}
