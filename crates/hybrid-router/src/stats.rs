use crate::config::ExecutionLocation;
use std::collections::VecDeque;

/// Exponential moving averages of success rate and latency for one
/// (agent_type, operation, location) bucket, backed by a bounded record
/// history so `len()` reflects retained samples.
#[derive(Debug, Clone)]
pub(crate) struct OutcomeStats {
    pub success_ema: f64,
    pub latency_ema_ms: f64,
    records: VecDeque<bool>,
    max_records: usize,
    initialized: bool,
}

impl OutcomeStats {
    fn new(max_records: usize) -> Self {
        Self {
            success_ema: 1.0,
            latency_ema_ms: 0.0,
            records: VecDeque::new(),
            max_records,
            initialized: false,
        }
    }

    fn record(&mut self, alpha: f64, success: bool, latency_ms: f64) {
        if !self.initialized {
            self.success_ema = if success { 1.0 } else { 0.0 };
            self.latency_ema_ms = latency_ms;
            self.initialized = true;
        } else {
            let success_value = if success { 1.0 } else { 0.0 };
            self.success_ema = alpha * success_value + (1.0 - alpha) * self.success_ema;
            self.latency_ema_ms = alpha * latency_ms + (1.0 - alpha) * self.latency_ema_ms;
        }

        self.records.push_back(success);
        while self.records.len() > self.max_records {
            self.records.pop_front();
        }
    }
}

/// Per-bucket outcome tracker keyed by (agent_type, operation, location).
#[derive(Debug, Default)]
pub(crate) struct StatsTable {
    buckets: std::collections::HashMap<(String, String, ExecutionLocation), OutcomeStats>,
}

impl StatsTable {
    pub(crate) fn record(
        &mut self,
        agent_type: &str,
        operation: &str,
        location: ExecutionLocation,
        success: bool,
        latency_ms: f64,
        alpha: f64,
        max_records: usize,
    ) {
        let key = (agent_type.to_string(), operation.to_string(), location);
        let stats = self
            .buckets
            .entry(key)
            .or_insert_with(|| OutcomeStats::new(max_records));
        stats.record(alpha, success, latency_ms);
    }

    pub(crate) fn get(
        &self,
        agent_type: &str,
        operation: &str,
        location: ExecutionLocation,
    ) -> Option<&OutcomeStats> {
        self.buckets
            .get(&(agent_type.to_string(), operation.to_string(), location))
    }
}
