use std::time::Duration;
use thiserror::Error;

/// Errors returned by the `CircuitBreaker` service.
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; calls are not permitted.
    ///
    /// `retry_after` is a hint for how long the caller should wait before
    /// trying again; it is the remaining time until the circuit transitions
    /// to half-open.
    #[error("circuit is open; retry after {retry_after:?}")]
    OpenCircuit {
        /// Remaining time until the circuit allows a probe call.
        retry_after: Duration,
    },

    /// An error returned by the inner service.
    #[error("inner service error: {0}")]
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    /// Returns true if the error indicates the circuit is open.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::OpenCircuit { .. })
    }

    /// Returns the retry-after hint, if the circuit is open.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CircuitBreakerError::OpenCircuit { retry_after } => Some(*retry_after),
            CircuitBreakerError::Inner(_) => None,
        }
    }

    /// Returns the inner error if present.
    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Inner(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<E> for CircuitBreakerError<E> {
    fn from(err: E) -> Self {
        CircuitBreakerError::Inner(err)
    }
}
