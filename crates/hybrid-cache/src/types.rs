//! Entries, deltas, and conflict records shared across the cache tiers.

use std::time::{Duration, Instant};

/// The kind of change a [`CacheDelta`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOp {
    Create,
    Update,
    Delete,
}

/// A pending (or synced) mutation awaiting delivery to the sync layer.
#[derive(Debug, Clone)]
pub struct CacheDelta {
    pub delta_id: String,
    pub namespace: String,
    pub key: String,
    pub operation: DeltaOp,
    pub old_checksum: Option<String>,
    /// `None` for a collapsed `Delete`.
    pub new_checksum: Option<String>,
    pub synced: bool,
    /// Monotonic sequence number; breaks ties when collapsing a run of
    /// deltas for the same key in creation order.
    pub(crate) seq: u64,
}

impl CacheDelta {
    pub fn full_key(&self) -> String {
        full_key(&self.namespace, &self.key)
    }
}

pub fn full_key(namespace: &str, key: &str) -> String {
    format!("{namespace}:{key}")
}

/// A divergence between the checksum we hold for a key and the one the
/// backend reports, surfaced by [`crate::Cache::detect_conflicts`].
#[derive(Debug, Clone)]
pub struct CacheConflict {
    pub namespace: String,
    pub key: String,
    pub local_checksum: String,
    pub backend_checksum: String,
}

#[derive(Debug, Clone)]
pub(crate) struct StoredValue {
    pub value: serde_json::Value,
    pub checksum: String,
    pub tags: Vec<String>,
    pub inserted_at: Instant,
    pub last_access: Instant,
    pub ttl: Option<Duration>,
}

impl StoredValue {
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.duration_since(self.inserted_at) >= ttl,
            None => false,
        }
    }
}

pub(crate) fn checksum_of(value: &serde_json::Value) -> String {
    use sha2::{Digest, Sha256};
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    hex::encode(digest)
}
