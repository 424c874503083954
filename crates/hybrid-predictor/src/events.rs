//! Event types for the predictor.

use hybrid_resilience_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by the predictor.
#[derive(Debug, Clone)]
pub enum PredictorEvent {
    /// A prediction round completed for a user.
    Predicted {
        pattern_name: String,
        timestamp: Instant,
        user_id: String,
        candidate_count: usize,
    },
    /// Keys were added to the prefetch slot.
    Prefetched {
        pattern_name: String,
        timestamp: Instant,
        user_id: String,
        key_count: usize,
    },
    /// The adaptive threshold was adjusted.
    ThresholdAdjusted {
        pattern_name: String,
        timestamp: Instant,
        new_threshold: f64,
    },
}

impl ResilienceEvent for PredictorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PredictorEvent::Predicted { .. } => "predicted",
            PredictorEvent::Prefetched { .. } => "prefetched",
            PredictorEvent::ThresholdAdjusted { .. } => "threshold_adjusted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PredictorEvent::Predicted { timestamp, .. }
            | PredictorEvent::Prefetched { timestamp, .. }
            | PredictorEvent::ThresholdAdjusted { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            PredictorEvent::Predicted { pattern_name, .. }
            | PredictorEvent::Prefetched { pattern_name, .. }
            | PredictorEvent::ThresholdAdjusted { pattern_name, .. } => pattern_name,
        }
    }
}
