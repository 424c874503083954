use crate::types::{PullOutcome, PushOutcome, SyncBatch};
use async_trait::async_trait;
use std::collections::HashMap;

/// The remote side of a sync round. Implementations wrap whatever carries
/// bytes to the backend (HTTP, gRPC, a message bus) — this layer only
/// requires the request/response shapes below.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn push(&self, batch: SyncBatch) -> PushOutcome;

    async fn pull(&self, known_backend_checksums: &HashMap<String, String>) -> PullOutcome;
}
