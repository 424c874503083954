//! Event types for the router.

use crate::config::ExecutionLocation;
use hybrid_resilience_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by the router.
#[derive(Debug, Clone)]
pub enum RouterEvent {
    /// A placement decision was made.
    DecisionMade {
        pattern_name: String,
        timestamp: Instant,
        agent_type: String,
        operation: String,
        location: ExecutionLocation,
        reason: &'static str,
    },
    /// An outcome was recorded for a previous decision.
    OutcomeRecorded {
        pattern_name: String,
        timestamp: Instant,
        agent_type: String,
        operation: String,
        location: ExecutionLocation,
        success: bool,
    },
    /// A backend endpoint was forced unhealthy, forcing Edge for Hybrid decisions.
    MarkedUnhealthy {
        pattern_name: String,
        timestamp: Instant,
    },
    /// A backend endpoint's health was restored.
    MarkedHealthy {
        pattern_name: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for RouterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RouterEvent::DecisionMade { .. } => "decision_made",
            RouterEvent::OutcomeRecorded { .. } => "outcome_recorded",
            RouterEvent::MarkedUnhealthy { .. } => "marked_unhealthy",
            RouterEvent::MarkedHealthy { .. } => "marked_healthy",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RouterEvent::DecisionMade { timestamp, .. }
            | RouterEvent::OutcomeRecorded { timestamp, .. }
            | RouterEvent::MarkedUnhealthy { timestamp, .. }
            | RouterEvent::MarkedHealthy { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            RouterEvent::DecisionMade { pattern_name, .. }
            | RouterEvent::OutcomeRecorded { pattern_name, .. }
            | RouterEvent::MarkedUnhealthy { pattern_name, .. }
            | RouterEvent::MarkedHealthy { pattern_name, .. } => pattern_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_match_variant() {
        let now = Instant::now();
        let event = RouterEvent::DecisionMade {
            pattern_name: "router".to_string(),
            timestamp: now,
            agent_type: "products".to_string(),
            operation: "get".to_string(),
            location: ExecutionLocation::Edge,
            reason: "privacy_sensitive",
        };
        assert_eq!(event.event_type(), "decision_made");
        assert_eq!(event.pattern_name(), "router");
    }
}
