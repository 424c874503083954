//! Local error type for dispatched backend calls.
//!
//! Each resilience-layer crate wraps errors differently (`Retry` is
//! transparent, `CircuitBreaker`/`TimeLimiter` wrap, `Bulkhead` requires the
//! inner error to convert *from* its own error type). Composing all five
//! through one generic chain would need a `From<BulkheadError>` impl for a
//! type buried inside foreign wrappers, which the orphan rules forbid.
//! Instead every wrapping layer's error is flattened back to `BackendError`
//! with a plain function immediately after that layer is applied; the one
//! conversion the orphan rules do allow (`BulkheadError` -> a type local to
//! this crate) is the only trait impl in the stack.

use std::time::Duration;

use hybrid_bulkhead::BulkheadError;
use hybrid_circuitbreaker::CircuitBreakerError;
use hybrid_timelimiter::TimeLimiterError;

/// Backend error sub-kind, per the retry classification: transient and
/// unknown errors are retried, permanent ones are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentErrorKind {
    Transient,
    Permanent,
    Unknown,
}

/// An error returned by a [`crate::backend::BackendAgent`] implementation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct AgentError {
    pub kind: AgentErrorKind,
    pub message: String,
}

impl AgentError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self { kind: AgentErrorKind::Transient, message: message.into() }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self { kind: AgentErrorKind::Permanent, message: message.into() }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self { kind: AgentErrorKind::Unknown, message: message.into() }
    }
}

/// The error surfaced by one dispatch through the resilience stack, after
/// every layer's own error type has been flattened back into this one.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The backend agent returned an error.
    #[error("backend agent error: {0}")]
    Agent(#[from] AgentError),
    /// The per-call timeout elapsed.
    #[error("backend call timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
    /// The circuit is open; retry after the given duration.
    #[error("circuit open, retry after {retry_after:?}")]
    CircuitOpen { retry_after: Duration },
    /// The bulkhead has no free concurrency slot.
    #[error("bulkhead full ({max_concurrent_calls} max concurrent calls)")]
    BulkheadFull { max_concurrent_calls: usize },
    /// The bulkhead's wait for a free slot itself timed out.
    #[error("bulkhead wait for a free slot timed out")]
    BulkheadTimeout,
    /// No backend agent is registered for the requested `agent_type`.
    #[error("no backend agent registered for this agent_type")]
    NoAgent,
}

impl BackendError {
    /// Only transient and unknown backend errors, plus timeouts, are
    /// retried; circuit/bulkhead rejections and permanent errors are not.
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::Timeout { .. } | BackendError::Agent(AgentError { kind: AgentErrorKind::Transient | AgentErrorKind::Unknown, .. })
        )
    }
}

impl From<BulkheadError> for BackendError {
    fn from(err: BulkheadError) -> Self {
        match err {
            BulkheadError::BulkheadFull { max_concurrent_calls } => {
                BackendError::BulkheadFull { max_concurrent_calls }
            }
            BulkheadError::Timeout => BackendError::BulkheadTimeout,
        }
    }
}

pub(crate) fn from_timelimiter(err: TimeLimiterError<BackendError>) -> BackendError {
    match err {
        TimeLimiterError::Timeout { elapsed } => BackendError::Timeout { elapsed },
        TimeLimiterError::Inner(e) => e,
    }
}

pub(crate) fn from_circuit_breaker(err: CircuitBreakerError<BackendError>) -> BackendError {
    match err {
        CircuitBreakerError::OpenCircuit { retry_after } => BackendError::CircuitOpen { retry_after },
        CircuitBreakerError::Inner(e) => e,
    }
}
