use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Relative sync priority; drained `Immediate` first, `Deferred` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPriority {
    Immediate,
    High,
    Medium,
    Low,
    Deferred,
}

impl Default for SyncPriority {
    fn default() -> Self {
        SyncPriority::Medium
    }
}

/// The kind of change a delta represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaOperation {
    Create,
    Update,
    Delete,
    Patch,
}

/// Direction of a sync round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    Push,
    Pull,
    Bidirectional,
}

/// A single entity mutation awaiting or having completed sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delta {
    pub delta_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub operation: DeltaOperation,
    pub old_version: Option<u64>,
    pub new_version: u64,
    pub old_checksum: Option<String>,
    pub new_checksum: String,
    pub data: Option<serde_json::Value>,
    pub patch: Option<serde_json::Value>,
    pub priority: SyncPriority,
    pub timestamp: DateTime<Utc>,
    pub compressed: bool,
    pub size_bytes: usize,
}

impl Delta {
    pub fn entity_key(&self) -> String {
        entity_key(&self.entity_type, &self.entity_id)
    }
}

pub fn entity_key(entity_type: &str, entity_id: &str) -> String {
    format!("{entity_type}:{entity_id}")
}

/// A batch of deltas ready for transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncBatch {
    pub batch_id: String,
    pub deltas: Vec<Delta>,
    pub direction: SyncDirection,
    pub total_size_bytes: usize,
    pub compressed_size_bytes: Option<usize>,
}

/// A detected divergence between local and backend state for one entity.
#[derive(Debug, Clone)]
pub struct ConflictInfo {
    pub entity_type: String,
    pub entity_id: String,
    pub local_version: u64,
    pub backend_version: u64,
    pub local_checksum: String,
    pub backend_checksum: String,
    pub local_data: Option<serde_json::Value>,
    pub backend_data: Option<serde_json::Value>,
    pub local_timestamp: DateTime<Utc>,
    pub backend_timestamp: DateTime<Utc>,
    pub detected_at: DateTime<Utc>,
}

impl ConflictInfo {
    pub fn entity_key(&self) -> String {
        entity_key(&self.entity_type, &self.entity_id)
    }
}

/// Conflict resolution strategy, consulted after any per-entity-type
/// custom resolver declines to handle a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    LastWriteWins,
    FirstWriteWins,
    ServerWins,
    ClientWins,
    Merge,
    Manual,
}

impl Default for ConflictResolution {
    fn default() -> Self {
        ConflictResolution::LastWriteWins
    }
}

/// What the remote side reported back after a push.
#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub success: bool,
    pub synced_ids: Vec<String>,
    pub error: Option<String>,
}

/// What the remote side returned for a pull.
#[derive(Debug, Clone)]
pub struct PullOutcome {
    pub success: bool,
    pub deltas: Vec<Delta>,
    pub backend_checksums: HashMap<String, String>,
    pub error: Option<String>,
}
