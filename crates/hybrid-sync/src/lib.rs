//! Delta synchronization between an edge node and its backend.
//!
//! The [`SyncLayer`] creates deltas for local mutations, queues them while
//! offline, batches and (optionally) compresses them for transport, detects
//! conflicts against incoming backend state, and resolves conflicts via a
//! per-entity-type custom resolver or a configurable default policy. It is
//! the sole owner of the authoritative backend checksum table; callers that
//! need to detect conflicts against backend state (e.g. the cache) borrow
//! it rather than keeping their own copy.

mod checksum;
mod compress;
mod config;
mod error;
mod events;
mod metrics;
mod queue;
mod transport;
mod types;
mod version_vector;

pub use config::{SyncConfig, SyncConfigBuilder};
pub use error::SyncError;
pub use events::SyncEvent;
pub use metrics::SyncMetrics;
pub use transport::SyncTransport;
pub use types::{
    ConflictInfo, ConflictResolution, Delta, DeltaOperation, PullOutcome, PushOutcome, SyncBatch,
    SyncDirection, SyncPriority,
};

use chrono::Utc;
use hybrid_resilience_core::EventListeners;
use parking_lot::RwLock;
use queue::OfflineQueue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use version_vector::VersionVector;

type ConflictResolver = Box<dyn Fn(&ConflictInfo) -> (ConflictResolution, Option<serde_json::Value>) + Send + Sync>;

/// Result of one push round.
#[derive(Debug, Clone)]
pub struct PushResult {
    pub status: &'static str,
    pub pushed: usize,
    pub error: Option<String>,
}

/// Result of one pull round.
#[derive(Debug, Clone)]
pub struct PullResult {
    pub status: &'static str,
    pub pulled: usize,
    pub conflicts: usize,
    pub error: Option<String>,
}

/// Combined result of [`SyncLayer::bidirectional_sync`].
#[derive(Debug, Clone)]
pub struct BidirectionalSyncResult {
    pub push: PushResult,
    pub pull: PullResult,
    pub conflicts_resolved: usize,
}

struct SyncState {
    version_vector: RwLock<VersionVector>,
    local_checksums: RwLock<HashMap<String, String>>,
    backend_checksums: RwLock<HashMap<String, String>>,
    offline_queue: RwLock<OfflineQueue>,
    pending_conflicts: RwLock<HashMap<String, ConflictInfo>>,
    resolvers: RwLock<HashMap<String, ConflictResolver>>,
    transport: RwLock<Option<Arc<dyn SyncTransport>>>,
    metrics: RwLock<SyncMetrics>,
}

/// Exchanges deltas with a remote backend, resolves conflicts, and
/// preserves causal order across offline episodes.
pub struct SyncLayer {
    config: Arc<SyncConfig>,
    state: Arc<SyncState>,
    event_listeners: EventListeners<SyncEvent>,
}

impl SyncLayer {
    pub fn new(config: SyncConfig) -> Self {
        let offline_queue = OfflineQueue::new(config.max_offline_queue_size);
        Self {
            config: Arc::new(config),
            state: Arc::new(SyncState {
                version_vector: RwLock::new(VersionVector::new()),
                local_checksums: RwLock::new(HashMap::new()),
                backend_checksums: RwLock::new(HashMap::new()),
                offline_queue: RwLock::new(offline_queue),
                pending_conflicts: RwLock::new(HashMap::new()),
                resolvers: RwLock::new(HashMap::new()),
                transport: RwLock::new(None),
                metrics: RwLock::new(SyncMetrics::default()),
            }),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn with_event_listeners(mut self, listeners: EventListeners<SyncEvent>) -> Self {
        self.event_listeners = listeners;
        self
    }

    pub fn set_transport(&self, transport: Arc<dyn SyncTransport>) {
        *self.state.transport.write() = Some(transport);
    }

    /// Registers a custom conflict resolver for `entity_type`, consulted
    /// before the default resolution policy.
    pub fn register_resolver<F>(&self, entity_type: impl Into<String>, resolver: F)
    where
        F: Fn(&ConflictInfo) -> (ConflictResolution, Option<serde_json::Value>) + Send + Sync + 'static,
    {
        self.state
            .resolvers
            .write()
            .insert(entity_type.into(), Box::new(resolver));
    }

    /// Returns the authoritative backend checksum table. The cache borrows
    /// this rather than keeping its own copy of backend state.
    pub fn backend_checksums(&self) -> HashMap<String, String> {
        self.state.backend_checksums.read().clone()
    }

    // === Delta creation ===

    /// Creates a delta for an entity mutation, bumping its version and
    /// updating the local checksum.
    pub fn create_delta(
        &self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        operation: DeltaOperation,
        data: Option<serde_json::Value>,
        patch: Option<serde_json::Value>,
        priority: SyncPriority,
    ) -> Delta {
        let entity_type = entity_type.into();
        let entity_id = entity_id.into();
        let entity_key = types::entity_key(&entity_type, &entity_id);

        let mut version_vector = self.state.version_vector.write();
        let old_version = version_vector.get(&entity_key);
        let new_version = version_vector.increment(&entity_key);
        drop(version_vector);

        let payload = data.clone().or_else(|| patch.clone()).unwrap_or(serde_json::json!({}));
        let new_checksum = checksum::compute_checksum(&payload);

        let mut local_checksums = self.state.local_checksums.write();
        let old_checksum = local_checksums.get(&entity_key).cloned();
        if operation == DeltaOperation::Delete {
            local_checksums.remove(&entity_key);
        } else {
            local_checksums.insert(entity_key.clone(), new_checksum.clone());
        }
        drop(local_checksums);

        let size_bytes = serde_json::to_vec(&payload).map(|v| v.len()).unwrap_or(0);

        Delta {
            delta_id: format!("delta_{}_{}", uuid::Uuid::new_v4(), entity_id),
            entity_type,
            entity_id,
            operation,
            old_version: if old_version > 0 { Some(old_version) } else { None },
            new_version,
            old_checksum,
            new_checksum,
            data: matches!(operation, DeltaOperation::Create | DeltaOperation::Update).then(|| data.unwrap_or_default()),
            patch: matches!(operation, DeltaOperation::Patch).then(|| patch.unwrap_or_default()),
            priority,
            timestamp: Utc::now(),
            compressed: false,
            size_bytes,
        }
    }

    // === Offline queue ===

    /// Queues `delta` for a future sync round.
    pub fn queue_for_sync(&self, delta: Delta) -> bool {
        let entity_key = delta.entity_key();
        let mut queue = self.state.offline_queue.write();
        let before = queue.dropped_count();
        let queued = queue.push(delta);
        let dropped = queue.dropped_count() > before;
        let queue_size = queue.len();
        drop(queue);

        self.state.metrics.write().offline_queue_size = queue_size;

        if dropped {
            self.event_listeners.emit(&SyncEvent::DeltaDropped {
                pattern_name: self.config.node_id.clone(),
                timestamp: Instant::now(),
                entity_key,
            });
        }

        queued
    }

    pub fn pending_deltas(&self, priority: Option<SyncPriority>, limit: Option<usize>) -> Vec<Delta> {
        self.state.offline_queue.read().pending(priority, limit)
    }

    pub fn offline_queue_len(&self) -> usize {
        self.state.offline_queue.read().len()
    }

    // === Batching ===

    /// Builds a batch of up to `max_size` (or the configured default)
    /// pending deltas, accounting estimated compression savings when the
    /// batch exceeds the compression threshold.
    pub fn create_sync_batch(
        &self,
        direction: SyncDirection,
        max_size: Option<usize>,
        priority: Option<SyncPriority>,
    ) -> SyncBatch {
        let max_size = max_size.unwrap_or(self.config.max_batch_size);
        let deltas = self.pending_deltas(priority, Some(max_size));
        let total_size_bytes: usize = deltas.iter().map(|d| d.size_bytes).sum();

        let compressed_size_bytes = if total_size_bytes > self.config.compression_threshold_bytes {
            let estimate = compress::estimate_compressed_size(&deltas);
            self.state.metrics.write().bytes_compressed_saved +=
                total_size_bytes.saturating_sub(estimate) as u64;
            Some(estimate)
        } else {
            None
        };

        SyncBatch {
            batch_id: format!("batch_{}", uuid::Uuid::new_v4()),
            deltas,
            direction,
            total_size_bytes,
            compressed_size_bytes,
        }
    }

    // === Push / pull ===

    /// Pushes pending deltas to the registered transport, retrying the
    /// unsynced remainder on partial success with backoff delays of 1, 5,
    /// and 15 seconds (three attempts total).
    pub async fn push(&self) -> Result<PushResult, SyncError> {
        let start = Instant::now();
        self.state.metrics.write().syncs_attempted += 1;

        let Some(transport) = self.state.transport.read().clone() else {
            return Err(SyncError::NoTransport { operation: "push" });
        };

        let mut batch = self.create_sync_batch(SyncDirection::Push, None, None);
        if batch.deltas.is_empty() {
            return Ok(PushResult {
                status: "no_changes",
                pushed: 0,
                error: None,
            });
        }

        let mut total_pushed = 0usize;
        let mut last_error = None;

        for attempt in 0..config::MAX_RETRIES {
            let outcome = transport.push(batch.clone()).await;
            if !outcome.synced_ids.is_empty() {
                let removed = self.state.offline_queue.write().remove_synced(&outcome.synced_ids);
                total_pushed += removed;
                self.state.metrics.write().deltas_pushed += removed as u64;
            }

            if outcome.success && outcome.synced_ids.len() >= batch.deltas.len() {
                self.state.metrics.write().bytes_transferred += batch.total_size_bytes as u64;
                self.state.metrics.write().syncs_completed += 1;
                self.state.metrics.write().record_sync_time(start.elapsed().as_secs_f64() * 1000.0);

                self.event_listeners.emit(&SyncEvent::Pushed {
                    pattern_name: self.config.node_id.clone(),
                    timestamp: Instant::now(),
                    delta_count: total_pushed,
                    success: true,
                });

                return Ok(PushResult {
                    status: "success",
                    pushed: total_pushed,
                    error: None,
                });
            }

            last_error = outcome.error;

            let remaining: Vec<Delta> = batch
                .deltas
                .into_iter()
                .filter(|d| !outcome.synced_ids.contains(&d.delta_id))
                .collect();
            if remaining.is_empty() {
                break;
            }
            batch = SyncBatch {
                batch_id: format!("batch_retry_{attempt}"),
                total_size_bytes: remaining.iter().map(|d| d.size_bytes).sum(),
                deltas: remaining,
                direction: SyncDirection::Push,
                compressed_size_bytes: None,
            };

            if attempt + 1 < config::MAX_RETRIES {
                tokio::time::sleep(Duration::from_secs(config::RETRY_DELAYS_SECS[attempt])).await;
            }
        }

        self.state.metrics.write().syncs_failed += 1;
        self.event_listeners.emit(&SyncEvent::Pushed {
            pattern_name: self.config.node_id.clone(),
            timestamp: Instant::now(),
            delta_count: total_pushed,
            success: false,
        });

        Ok(PushResult {
            status: if total_pushed > 0 { "partial" } else { "failed" },
            pushed: total_pushed,
            error: last_error,
        })
    }

    /// Pulls incoming deltas, detects conflicts against local state, and
    /// applies every non-conflicting delta.
    pub async fn pull(&self) -> Result<PullResult, SyncError> {
        let start = Instant::now();
        self.state.metrics.write().syncs_attempted += 1;

        let Some(transport) = self.state.transport.read().clone() else {
            return Err(SyncError::NoTransport { operation: "pull" });
        };

        let known_backend_checksums = self.backend_checksums();
        let outcome = transport.pull(&known_backend_checksums).await;

        if !outcome.success {
            self.state.metrics.write().syncs_failed += 1;
            return Ok(PullResult {
                status: "failed",
                pulled: 0,
                conflicts: 0,
                error: outcome.error,
            });
        }

        *self.state.backend_checksums.write() = outcome.backend_checksums;

        let conflicts = self.detect_conflicts(&outcome.deltas);
        let conflicting_keys: std::collections::HashSet<String> =
            conflicts.iter().map(|c| c.entity_key()).collect();

        let mut applied = 0usize;
        for delta in &outcome.deltas {
            if !conflicting_keys.contains(&delta.entity_key()) {
                self.apply_incoming_delta(delta);
                applied += 1;
            }
        }

        self.state.metrics.write().syncs_completed += 1;
        self.state.metrics.write().deltas_pulled += applied as u64;
        self.state.metrics.write().record_sync_time(start.elapsed().as_secs_f64() * 1000.0);

        self.event_listeners.emit(&SyncEvent::Pulled {
            pattern_name: self.config.node_id.clone(),
            timestamp: Instant::now(),
            delta_count: applied,
            success: true,
        });

        Ok(PullResult {
            status: "success",
            pulled: applied,
            conflicts: conflicts.len(),
            error: None,
        })
    }

    /// Pushes, pulls, auto-resolves any surfaced conflicts, then pushes
    /// whatever deltas resolution produced.
    pub async fn bidirectional_sync(&self) -> BidirectionalSyncResult {
        let push_result = self.push().await.unwrap_or(PushResult {
            status: "failed",
            pushed: 0,
            error: Some("no transport".to_string()),
        });
        let pull_result = self.pull().await.unwrap_or(PullResult {
            status: "failed",
            pulled: 0,
            conflicts: 0,
            error: Some("no transport".to_string()),
        });

        let resolution_deltas = self.auto_resolve_conflicts();
        let conflicts_resolved = resolution_deltas.len();
        for delta in resolution_deltas {
            self.queue_for_sync(delta);
        }
        if conflicts_resolved > 0 {
            let _ = self.push().await;
        }

        BidirectionalSyncResult {
            push: push_result,
            pull: pull_result,
            conflicts_resolved,
        }
    }

    fn apply_incoming_delta(&self, delta: &Delta) {
        let entity_key = delta.entity_key();
        if delta.operation == DeltaOperation::Delete {
            self.state.local_checksums.write().remove(&entity_key);
            self.state.backend_checksums.write().remove(&entity_key);
        } else {
            self.state.local_checksums.write().insert(entity_key.clone(), delta.new_checksum.clone());
            self.state.backend_checksums.write().insert(entity_key.clone(), delta.new_checksum.clone());
            self.state.version_vector.write().set(&entity_key, delta.new_version);
        }
    }

    // === Conflicts ===

    /// Flags incoming deltas whose `old_checksum` disagrees with the
    /// locally-recorded checksum: local state changed since the backend's
    /// view of it.
    pub fn detect_conflicts(&self, incoming_deltas: &[Delta]) -> Vec<ConflictInfo> {
        let local_checksums = self.state.local_checksums.read();
        let version_vector = self.state.version_vector.read();
        let now = Utc::now();

        let mut conflicts = Vec::new();
        for delta in incoming_deltas {
            let entity_key = delta.entity_key();
            let Some(local_checksum) = local_checksums.get(&entity_key) else {
                continue;
            };
            if Some(local_checksum.as_str()) == delta.old_checksum.as_deref() {
                continue;
            }

            let conflict = ConflictInfo {
                entity_type: delta.entity_type.clone(),
                entity_id: delta.entity_id.clone(),
                local_version: version_vector.get(&entity_key),
                backend_version: delta.new_version,
                local_checksum: local_checksum.clone(),
                backend_checksum: delta.new_checksum.clone(),
                local_data: None,
                backend_data: delta.data.clone(),
                local_timestamp: now,
                backend_timestamp: delta.timestamp,
                detected_at: now,
            };

            self.state.pending_conflicts.write().insert(entity_key.clone(), conflict.clone());
            self.state.metrics.write().conflicts_detected += 1;
            self.event_listeners.emit(&SyncEvent::ConflictDetected {
                pattern_name: self.config.node_id.clone(),
                timestamp: Instant::now(),
                entity_key,
            });

            conflicts.push(conflict);
        }
        conflicts
    }

    /// Resolves the pending conflict for `entity_key` using `resolution`,
    /// returning a delta to re-enqueue when the resolution produces one
    /// (`ClientWins`, `Merge`).
    pub fn resolve_conflict(
        &self,
        entity_key: &str,
        resolution: ConflictResolution,
        merged_data: Option<serde_json::Value>,
    ) -> Option<Delta> {
        let conflict = self.state.pending_conflicts.write().remove(entity_key)?;

        let effective = match resolution {
            ConflictResolution::LastWriteWins => {
                if conflict.backend_timestamp >= conflict.local_timestamp {
                    ConflictResolution::ServerWins
                } else {
                    ConflictResolution::ClientWins
                }
            }
            other => other,
        };

        let resolved_delta = match effective {
            ConflictResolution::ServerWins => {
                self.state
                    .local_checksums
                    .write()
                    .insert(entity_key.to_string(), conflict.backend_checksum.clone());
                self.state.version_vector.write().set(entity_key, conflict.backend_version);
                None
            }
            ConflictResolution::ClientWins => Some(self.create_delta(
                conflict.entity_type.clone(),
                conflict.entity_id.clone(),
                DeltaOperation::Update,
                conflict.local_data.clone(),
                None,
                SyncPriority::High,
            )),
            ConflictResolution::Merge => merged_data.map(|data| {
                self.create_delta(
                    conflict.entity_type.clone(),
                    conflict.entity_id.clone(),
                    DeltaOperation::Update,
                    Some(data),
                    None,
                    SyncPriority::High,
                )
            }),
            ConflictResolution::Manual => {
                self.state.pending_conflicts.write().insert(entity_key.to_string(), conflict.clone());
                return None;
            }
            ConflictResolution::FirstWriteWins | ConflictResolution::LastWriteWins => None,
        };

        self.state.metrics.write().conflicts_resolved += 1;
        self.event_listeners.emit(&SyncEvent::ConflictResolved {
            pattern_name: self.config.node_id.clone(),
            timestamp: Instant::now(),
            entity_key: entity_key.to_string(),
            resolution: resolution_label(effective),
        });

        resolved_delta
    }

    /// Resolves every pending conflict: a registered per-entity-type
    /// resolver if present, otherwise the configured default policy.
    pub fn auto_resolve_conflicts(&self) -> Vec<Delta> {
        let entity_keys: Vec<String> = self.state.pending_conflicts.read().keys().cloned().collect();
        let mut deltas = Vec::new();

        for entity_key in entity_keys {
            let Some(conflict) = self.state.pending_conflicts.read().get(&entity_key).cloned() else {
                continue;
            };

            let resolvers = self.state.resolvers.read();
            let (resolution, merged_data) = match resolvers.get(&conflict.entity_type) {
                Some(resolver) => resolver(&conflict),
                None => (self.config.default_resolution, None),
            };
            drop(resolvers);

            if let Some(delta) = self.resolve_conflict(&entity_key, resolution, merged_data) {
                deltas.push(delta);
            }
        }

        deltas
    }

    pub fn pending_conflict_count(&self) -> usize {
        self.state.pending_conflicts.read().len()
    }

    pub fn get_metrics(&self) -> SyncMetrics {
        let mut metrics = self.state.metrics.read().clone();
        metrics.offline_queue_size = self.offline_queue_len();
        metrics.deltas_dropped = self.state.offline_queue.read().dropped_count();
        metrics
    }
}

fn resolution_label(resolution: ConflictResolution) -> &'static str {
    match resolution {
        ConflictResolution::LastWriteWins => "last_write_wins",
        ConflictResolution::FirstWriteWins => "first_write_wins",
        ConflictResolution::ServerWins => "server_wins",
        ConflictResolution::ClientWins => "client_wins",
        ConflictResolution::Merge => "merge",
        ConflictResolution::Manual => "manual",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    struct MockTransport {
        pushed: Mutex<Vec<SyncBatch>>,
    }

    #[async_trait]
    impl SyncTransport for MockTransport {
        async fn push(&self, batch: SyncBatch) -> PushOutcome {
            let synced_ids = batch.deltas.iter().map(|d| d.delta_id.clone()).collect();
            self.pushed.lock().push(batch);
            PushOutcome {
                success: true,
                synced_ids,
                error: None,
            }
        }

        async fn pull(&self, _known: &HashMap<String, String>) -> PullOutcome {
            PullOutcome {
                success: true,
                deltas: Vec::new(),
                backend_checksums: HashMap::new(),
                error: None,
            }
        }
    }

    fn layer() -> SyncLayer {
        SyncLayer::new(SyncConfig::builder("node-1").build())
    }

    #[test]
    fn create_delta_strictly_increases_version() {
        let layer = layer();
        let d1 = layer.create_delta("product", "1", DeltaOperation::Create, Some(json!({"name": "a"})), None, SyncPriority::Medium);
        let d2 = layer.create_delta("product", "1", DeltaOperation::Update, Some(json!({"name": "b"})), None, SyncPriority::Medium);
        assert_eq!(d1.new_version, 1);
        assert_eq!(d2.new_version, 2);
        assert_eq!(d2.old_version, Some(1));
    }

    #[test]
    fn queue_for_sync_then_pending_deltas_returns_it() {
        let layer = layer();
        let delta = layer.create_delta("product", "1", DeltaOperation::Update, Some(json!({})), None, SyncPriority::High);
        layer.queue_for_sync(delta.clone());

        let pending = layer.pending_deltas(None, None);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].delta_id, delta.delta_id);
    }

    #[tokio::test]
    async fn push_with_transport_clears_queue() {
        let layer = layer();
        layer.set_transport(Arc::new(MockTransport { pushed: Mutex::new(Vec::new()) }));
        let delta = layer.create_delta("product", "1", DeltaOperation::Update, Some(json!({})), None, SyncPriority::Medium);
        layer.queue_for_sync(delta);

        let result = layer.push().await.unwrap();
        assert_eq!(result.status, "success");
        assert_eq!(layer.offline_queue_len(), 0);
    }

    #[test]
    fn detect_conflicts_flags_mismatched_checksum() {
        let layer = layer();
        let local = layer.create_delta("product", "1", DeltaOperation::Update, Some(json!({"v": 1})), None, SyncPriority::Medium);

        let incoming = Delta {
            delta_id: "remote-1".to_string(),
            entity_type: "product".to_string(),
            entity_id: "1".to_string(),
            operation: DeltaOperation::Update,
            old_version: Some(0),
            new_version: 5,
            old_checksum: Some("stale-checksum".to_string()),
            new_checksum: "remote-checksum".to_string(),
            data: Some(json!({"v": 2})),
            patch: None,
            priority: SyncPriority::Medium,
            timestamp: Utc::now(),
            compressed: false,
            size_bytes: 0,
        };

        let conflicts = layer.detect_conflicts(&[incoming]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].local_checksum, local.new_checksum);
    }

    #[test]
    fn server_wins_adopts_backend_checksum() {
        let layer = layer();
        layer.create_delta("product", "1", DeltaOperation::Update, Some(json!({"v": 1})), None, SyncPriority::Medium);

        let incoming = Delta {
            delta_id: "remote-1".to_string(),
            entity_type: "product".to_string(),
            entity_id: "1".to_string(),
            operation: DeltaOperation::Update,
            old_version: Some(0),
            new_version: 9,
            old_checksum: Some("stale".to_string()),
            new_checksum: "remote-checksum".to_string(),
            data: Some(json!({"v": 2})),
            patch: None,
            priority: SyncPriority::Medium,
            timestamp: Utc::now(),
            compressed: false,
            size_bytes: 0,
        };
        layer.detect_conflicts(&[incoming]);

        let resolved = layer.resolve_conflict("product:1", ConflictResolution::ServerWins, None);
        assert!(resolved.is_none());
        assert_eq!(layer.pending_conflict_count(), 0);
    }

    #[test]
    fn custom_resolver_overrides_default_policy() {
        let layer = layer();
        layer.register_resolver("product", |_conflict| (ConflictResolution::ClientWins, None));
        layer.create_delta("product", "1", DeltaOperation::Update, Some(json!({"v": 1})), None, SyncPriority::Medium);

        let incoming = Delta {
            delta_id: "remote-1".to_string(),
            entity_type: "product".to_string(),
            entity_id: "1".to_string(),
            operation: DeltaOperation::Update,
            old_version: Some(0),
            new_version: 9,
            old_checksum: Some("stale".to_string()),
            new_checksum: "remote-checksum".to_string(),
            data: Some(json!({"v": 2})),
            patch: None,
            priority: SyncPriority::Medium,
            timestamp: Utc::now(),
            compressed: false,
            size_bytes: 0,
        };
        layer.detect_conflicts(&[incoming]);

        let deltas = layer.auto_resolve_conflicts();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].operation, DeltaOperation::Update);
    }
}
