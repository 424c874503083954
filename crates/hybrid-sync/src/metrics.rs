/// Point-in-time sync counters, returned by [`crate::SyncLayer::get_metrics`].
#[derive(Debug, Clone, Default)]
pub struct SyncMetrics {
    pub syncs_attempted: u64,
    pub syncs_completed: u64,
    pub syncs_failed: u64,
    pub deltas_pushed: u64,
    pub deltas_pulled: u64,
    pub conflicts_detected: u64,
    pub conflicts_resolved: u64,
    pub bytes_transferred: u64,
    pub bytes_compressed_saved: u64,
    pub average_sync_time_ms: f64,
    pub offline_queue_size: usize,
    pub deltas_dropped: u64,
}

impl SyncMetrics {
    pub fn success_rate(&self) -> f64 {
        if self.syncs_attempted == 0 {
            return 0.0;
        }
        self.syncs_completed as f64 / self.syncs_attempted as f64 * 100.0
    }

    pub(crate) fn record_sync_time(&mut self, elapsed_ms: f64) {
        let n = self.syncs_completed;
        if n == 0 {
            return;
        }
        self.average_sync_time_ms =
            (self.average_sync_time_ms * (n - 1) as f64 + elapsed_ms) / n as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_is_zero_with_no_attempts() {
        assert_eq!(SyncMetrics::default().success_rate(), 0.0);
    }

    #[test]
    fn success_rate_reflects_completed_over_attempted() {
        let metrics = SyncMetrics {
            syncs_attempted: 4,
            syncs_completed: 3,
            ..Default::default()
        };
        assert_eq!(metrics.success_rate(), 75.0);
    }
}
