use thiserror::Error;

/// Errors returned by sync operations.
///
/// Per the propagation policy, sync errors never fail `execute()` — they
/// are surfaced here so callers can update metrics and leave deltas queued.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The registered transport reported failure.
    #[error("transport error during {operation}: {message}")]
    Transport { operation: &'static str, message: String },

    /// No transport has been registered for the requested direction.
    #[error("no transport registered for {operation}")]
    NoTransport { operation: &'static str },

    /// A conflict exists for `entity_key` and requires resolution before
    /// the entity can sync further.
    #[error("conflict pending for {entity_key}")]
    Conflict { entity_key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_error_carries_entity_key() {
        let err = SyncError::Conflict {
            entity_key: "product:42".to_string(),
        };
        assert!(err.to_string().contains("product:42"));
    }
}
