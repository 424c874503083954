//! Health check integration for proactive circuit breaker control.
//!
//! Lets an external health-check system force the circuit open or closed
//! ahead of what the sliding window would otherwise decide, via the
//! `HealthTriggerable` trait from `hybrid-resilience-core`.

use crate::circuit::Circuit;
use crate::config::CircuitBreakerConfig;
use crate::CircuitBreaker;
use hybrid_resilience_core::HealthTriggerable;
use std::sync::Arc;
use tokio::sync::Mutex;

fn trigger_unhealthy_impl<Res, Err>(
    circuit: Arc<Mutex<Circuit>>,
    config: Arc<CircuitBreakerConfig<Res, Err>>,
) where
    Res: Send + Sync + 'static,
    Err: Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut circuit = circuit.lock().await;
        circuit.force_open(&config);
    });
}

fn trigger_healthy_impl<Res, Err>(
    circuit: Arc<Mutex<Circuit>>,
    config: Arc<CircuitBreakerConfig<Res, Err>>,
) where
    Res: Send + Sync + 'static,
    Err: Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut circuit = circuit.lock().await;
        circuit.force_closed(&config);
    });
}

impl<S, Req, Res, Err> HealthTriggerable for CircuitBreaker<S, Req, Res, Err>
where
    S: Send + Sync + 'static,
    Req: Send + Sync + 'static,
    Res: Send + Sync + 'static,
    Err: Send + Sync + 'static,
{
    fn trigger_unhealthy(&self) {
        trigger_unhealthy_impl(Arc::clone(&self.circuit), Arc::clone(&self.config));
    }

    fn trigger_healthy(&self) {
        trigger_healthy_impl(Arc::clone(&self.circuit), Arc::clone(&self.config));
    }
}
