use crate::types::{Delta, SyncPriority};
use std::collections::VecDeque;

pub const MAX_OFFLINE_QUEUE_SIZE: usize = 10_000;

fn priority_rank(priority: SyncPriority) -> u8 {
    match priority {
        SyncPriority::Immediate => 0,
        SyncPriority::High => 1,
        SyncPriority::Medium => 2,
        SyncPriority::Low => 3,
        SyncPriority::Deferred => 4,
    }
}

/// Bounded FIFO holding deltas awaiting sync. On overflow, the oldest
/// non-`Immediate` delta is dropped rather than rejecting the new one.
#[derive(Default)]
pub struct OfflineQueue {
    entries: VecDeque<Delta>,
    dropped: u64,
    max_size: usize,
}

impl OfflineQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            dropped: 0,
            max_size,
        }
    }

    /// Enqueues `delta`, dropping the oldest non-`Immediate` entry first if
    /// the queue is already at capacity. Returns `true` once enqueued.
    pub fn push(&mut self, delta: Delta) -> bool {
        if self.entries.len() >= self.max_size {
            if let Some(index) = self
                .entries
                .iter()
                .position(|d| d.priority != SyncPriority::Immediate)
            {
                self.entries.remove(index);
                self.dropped += 1;
            } else {
                // Every entry is Immediate; drop the oldest anyway to make room.
                self.entries.pop_front();
                self.dropped += 1;
            }
        }
        self.entries.push_back(delta);
        true
    }

    /// Returns up to `limit` pending deltas (or all, when `limit` is
    /// `None`), filtered by `priority` when given, ordered by priority
    /// class then timestamp.
    pub fn pending(&self, priority: Option<SyncPriority>, limit: Option<usize>) -> Vec<Delta> {
        let mut deltas: Vec<Delta> = self
            .entries
            .iter()
            .filter(|d| priority.map(|p| d.priority == p).unwrap_or(true))
            .cloned()
            .collect();

        deltas.sort_by(|a, b| {
            priority_rank(a.priority)
                .cmp(&priority_rank(b.priority))
                .then(a.timestamp.cmp(&b.timestamp))
        });

        if let Some(limit) = limit {
            deltas.truncate(limit);
        }
        deltas
    }

    /// Removes the deltas with the given IDs, returning the count removed.
    pub fn remove_synced(&mut self, delta_ids: &[String]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|d| !delta_ids.contains(&d.delta_id));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeltaOperation;
    use chrono::Utc;

    fn delta(id: &str, priority: SyncPriority) -> Delta {
        Delta {
            delta_id: id.to_string(),
            entity_type: "product".to_string(),
            entity_id: "1".to_string(),
            operation: DeltaOperation::Update,
            old_version: None,
            new_version: 1,
            old_checksum: None,
            new_checksum: "abc".to_string(),
            data: None,
            patch: None,
            priority,
            timestamp: Utc::now(),
            compressed: false,
            size_bytes: 0,
        }
    }

    #[test]
    fn pending_orders_by_priority_then_timestamp() {
        let mut queue = OfflineQueue::new(10);
        queue.push(delta("a", SyncPriority::Low));
        queue.push(delta("b", SyncPriority::Immediate));
        queue.push(delta("c", SyncPriority::High));

        let pending = queue.pending(None, None);
        let ids: Vec<&str> = pending.iter().map(|d| d.delta_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn overflow_drops_oldest_non_immediate() {
        let mut queue = OfflineQueue::new(2);
        queue.push(delta("keep-immediate", SyncPriority::Immediate));
        queue.push(delta("low", SyncPriority::Low));
        queue.push(delta("new", SyncPriority::Medium));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped_count(), 1);
        let ids: Vec<String> = queue.pending(None, None).into_iter().map(|d| d.delta_id).collect();
        assert!(ids.contains(&"keep-immediate".to_string()));
        assert!(!ids.contains(&"low".to_string()));
    }

    #[test]
    fn remove_synced_clears_matching_ids() {
        let mut queue = OfflineQueue::new(10);
        queue.push(delta("a", SyncPriority::Medium));
        queue.push(delta("b", SyncPriority::Medium));

        let removed = queue.remove_synced(&["a".to_string()]);
        assert_eq!(removed, 1);
        assert_eq!(queue.len(), 1);
    }
}
