use crate::types::ConflictResolution;

pub const MAX_BATCH_SIZE: usize = 100;
pub const COMPRESSION_THRESHOLD_BYTES: usize = 1024;
pub const RETRY_DELAYS_SECS: [u64; 3] = [1, 5, 15];
pub const MAX_RETRIES: usize = 3;

/// Configuration for a [`crate::SyncLayer`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub node_id: String,
    pub default_resolution: ConflictResolution,
    pub max_offline_queue_size: usize,
    pub max_batch_size: usize,
    pub compression_threshold_bytes: usize,
}

impl SyncConfig {
    pub fn builder(node_id: impl Into<String>) -> SyncConfigBuilder {
        SyncConfigBuilder::new(node_id)
    }
}

/// Builder for [`SyncConfig`].
pub struct SyncConfigBuilder {
    node_id: String,
    default_resolution: ConflictResolution,
    max_offline_queue_size: usize,
    max_batch_size: usize,
    compression_threshold_bytes: usize,
}

impl SyncConfigBuilder {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            default_resolution: ConflictResolution::default(),
            max_offline_queue_size: crate::queue::MAX_OFFLINE_QUEUE_SIZE,
            max_batch_size: MAX_BATCH_SIZE,
            compression_threshold_bytes: COMPRESSION_THRESHOLD_BYTES,
        }
    }

    pub fn default_resolution(mut self, resolution: ConflictResolution) -> Self {
        self.default_resolution = resolution;
        self
    }

    pub fn max_offline_queue_size(mut self, size: usize) -> Self {
        self.max_offline_queue_size = size;
        self
    }

    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    pub fn compression_threshold_bytes(mut self, bytes: usize) -> Self {
        self.compression_threshold_bytes = bytes;
        self
    }

    pub fn build(self) -> SyncConfig {
        SyncConfig {
            node_id: self.node_id,
            default_resolution: self.default_resolution,
            max_offline_queue_size: self.max_offline_queue_size,
            max_batch_size: self.max_batch_size,
            compression_threshold_bytes: self.compression_threshold_bytes,
        }
    }
}
