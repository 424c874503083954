//! Rolling latency tracking and the structured metrics report.

use std::collections::VecDeque;

use parking_lot::Mutex;

const WINDOW: usize = 1_000;

/// Rolling window of the last 1,000 call latencies (milliseconds), used to
/// compute P50/P95/P99 on demand.
#[derive(Default)]
pub(crate) struct LatencyWindow {
    samples: Mutex<VecDeque<f64>>,
}

impl LatencyWindow {
    pub(crate) fn record(&self, latency_ms: f64) {
        let mut samples = self.samples.lock();
        samples.push_back(latency_ms);
        if samples.len() > WINDOW {
            samples.pop_front();
        }
    }

    pub(crate) fn percentiles(&self) -> LatencyPercentiles {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return LatencyPercentiles::default();
        }
        let mut sorted: Vec<f64> = samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let avg = sorted.iter().sum::<f64>() / sorted.len() as f64;
        LatencyPercentiles {
            avg_ms: avg,
            p50_ms: percentile(&sorted, 0.50),
            p95_ms: percentile(&sorted, 0.95),
            p99_ms: percentile(&sorted, 0.99),
        }
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

#[derive(Debug, Clone, Default)]
pub struct LatencyPercentiles {
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

/// Structured counts by path, consulted by [`crate::Orchestrator::get_metrics`].
#[derive(Debug, Clone, Default)]
pub struct RequestCounts {
    pub total: u64,
    pub edge: u64,
    pub backend: u64,
    pub cache_hit: u64,
    pub validation_failed: u64,
    pub queued: u64,
    pub degraded: u64,
    pub circuit_open: u64,
    pub error: u64,
}

/// The full structured metrics report returned by [`crate::Orchestrator::get_metrics`].
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub requests: RequestCounts,
    pub latency: LatencyPercentiles,
    pub cache: hybrid_cache::CacheMetrics,
    pub sync: hybrid_sync::SyncMetrics,
    pub validator_threats_blocked: u64,
    pub predictor_threshold: f64,
}
