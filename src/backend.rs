//! Backend dispatch through the fixed resilience stack.
//!
//! Order (outer to inner): Bulkhead -> CircuitBreaker -> Retry -> Timeout ->
//! target. Each wrapping layer's error is flattened back to [`BackendError`]
//! immediately via `map_err` (see [`crate::error`]); the stack is built once
//! per `agent_type` and the resulting [`BackendService`] is cloned for every
//! call, since `CircuitBreakerLayer::layer` creates fresh circuit state on
//! every call and persistent breaker state requires reusing one instance.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tower::util::BoxCloneService;
use tower::{Layer, Service, ServiceExt};

use hybrid_bulkhead::BulkheadLayer;
use hybrid_circuitbreaker::{CircuitBreaker, CircuitBreakerLayer, CircuitState, SlidingWindowType};
use hybrid_retry::RetryLayer;
use hybrid_timelimiter::TimeLimiterLayer;

use crate::config::{ResilienceConfig, RetryBackoff};
use crate::error::{AgentError, BackendError};
use crate::types::{Parameters, Value};

/// A backend agent registered for one `agent_type`. Implementations
/// perform the actual remote call; cancellation-safety and deadline
/// handling are the resilience stack's job, not the agent's.
#[async_trait]
pub trait BackendAgent: Send + Sync {
    async fn call(&self, operation: &str, parameters: &Parameters) -> Result<Value, AgentError>;
}

/// One dispatch through a registered backend agent. Cloned once per retry
/// attempt (`Retry` requires `Req: Clone`).
#[derive(Clone)]
pub struct BackendCall {
    pub agent_type: Arc<str>,
    pub operation: Arc<str>,
    pub parameters: Parameters,
}

pub(crate) type BackendService = BoxCloneService<BackendCall, Value, BackendError>;

/// Exposes the admin-surface circuit operations (`force_circuit_open`,
/// `force_circuit_close`, `reset_resilience`) without naming the anonymous
/// layered service type the circuit breaker wraps.
#[async_trait]
pub(crate) trait CircuitControl: Send + Sync {
    async fn force_open(&self);
    async fn force_closed(&self);
    async fn reset(&self);
    fn state(&self) -> CircuitState;
}

struct CircuitControlImpl<S>(CircuitBreaker<S, BackendCall, Value, BackendError>);

#[async_trait]
impl<S> CircuitControl for CircuitControlImpl<S>
where
    S: Service<BackendCall, Response = Value, Error = BackendError> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    async fn force_open(&self) {
        self.0.force_open().await
    }

    async fn force_closed(&self) {
        self.0.force_closed().await
    }

    async fn reset(&self) {
        self.0.reset().await
    }

    fn state(&self) -> CircuitState {
        self.0.state_sync()
    }
}

/// One registered backend's dispatch path plus its admin handle.
pub(crate) struct BackendEntry {
    pub(crate) service: BackendService,
    pub(crate) circuit: Arc<dyn CircuitControl>,
}

/// Builds the fixed resilience stack around `agent`.
pub(crate) fn build_backend_service(
    agent: Arc<dyn BackendAgent>,
    config: &ResilienceConfig,
) -> BackendEntry {
    let target = tower::service_fn(move |call: BackendCall| {
        let agent = Arc::clone(&agent);
        Box::pin(async move {
            agent
                .call(&call.operation, &call.parameters)
                .await
                .map_err(BackendError::Agent)
        }) as BoxFuture<'static, Result<Value, BackendError>>
    });

    let timed = TimeLimiterLayer::<BackendCall>::builder()
        .timeout_duration(config.call_timeout)
        .build()
        .layer(target)
        .map_err(crate::error::from_timelimiter as fn(_) -> BackendError);

    let mut retry_builder = RetryLayer::<BackendCall, BackendError>::builder()
        .max_attempts(config.max_retries + 1)
        .retry_on(|e: &BackendError| e.is_retryable());
    retry_builder = match config.retry_backoff {
        RetryBackoff::Fixed(d) => retry_builder.fixed_backoff(d),
        RetryBackoff::Exponential(d) | RetryBackoff::ExponentialWithJitter(d) => {
            retry_builder.exponential_backoff(d)
        }
    };
    let retried = retry_builder.build().layer(timed);

    let breaker_layer = CircuitBreakerLayer::<Value, BackendError>::builder()
        .failure_rate_threshold(config.failure_rate_threshold)
        .consecutive_failure_threshold(config.consecutive_failure_threshold)
        .minimum_number_of_calls(config.minimum_calls)
        .sliding_window_type(SlidingWindowType::TimeBased)
        .sliding_window_duration(Duration::from_secs(config.window_time_seconds))
        .wait_duration_in_open(config.recovery_timeout)
        .permitted_calls_in_half_open(config.half_open_max_calls)
        .build();
    let breaker = breaker_layer.layer(retried);
    let circuit: Arc<dyn CircuitControl> = Arc::new(CircuitControlImpl(breaker.clone()));
    let breaker = breaker.map_err(crate::error::from_circuit_breaker as fn(_) -> BackendError);

    let bulkheaded = BulkheadLayer::builder()
        .max_concurrent_calls(config.max_concurrent_calls)
        .max_wait_duration(Some(Duration::from_millis(config.queue_timeout_ms)))
        .build()
        .layer(breaker);

    BackendEntry {
        service: BoxCloneService::new(bulkheaded),
        circuit,
    }
}
