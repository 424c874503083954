//! Event types for the validator.

use hybrid_resilience_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by the validator.
#[derive(Debug, Clone)]
pub enum ValidatorEvent {
    /// A field finished validation (pass or fail).
    Validated {
        pattern_name: String,
        timestamp: Instant,
        field_name: String,
        valid: bool,
    },
    /// A security pattern (SQL injection, XSS, ...) was detected and the
    /// value was redacted.
    ThreatBlocked {
        pattern_name: String,
        timestamp: Instant,
        field_name: String,
    },
    /// A validation result was served from cache instead of re-evaluated.
    CacheHit {
        pattern_name: String,
        timestamp: Instant,
        field_name: String,
    },
}

impl ResilienceEvent for ValidatorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ValidatorEvent::Validated { .. } => "validated",
            ValidatorEvent::ThreatBlocked { .. } => "threat_blocked",
            ValidatorEvent::CacheHit { .. } => "cache_hit",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ValidatorEvent::Validated { timestamp, .. }
            | ValidatorEvent::ThreatBlocked { timestamp, .. }
            | ValidatorEvent::CacheHit { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            ValidatorEvent::Validated { pattern_name, .. }
            | ValidatorEvent::ThreatBlocked { pattern_name, .. }
            | ValidatorEvent::CacheHit { pattern_name, .. } => pattern_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_match_variant() {
        let event = ValidatorEvent::ThreatBlocked {
            pattern_name: "validator".to_string(),
            timestamp: Instant::now(),
            field_name: "comment".to_string(),
        };
        assert_eq!(event.event_type(), "threat_blocked");
        assert_eq!(event.pattern_name(), "validator");
    }
}
