//! The execution core: wires the router, cache, predictor, validator, sync
//! layer and the per-`agent_type` resilience stacks behind one `execute`
//! entry point plus the administration surface.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use tower::ServiceExt;
use uuid::Uuid;

use hybrid_cache::Cache;
use hybrid_predictor::{PredictionContext, Predictor};
use hybrid_router::{ExecutionLocation, OperationContext, Router};
use hybrid_sync::{DeltaOperation, SyncDirection, SyncLayer, SyncPriority};
use hybrid_validator::Validator;

use crate::backend::{build_backend_service, BackendAgent, BackendCall, BackendEntry};
use crate::config::CoreConfig;
use crate::error::AgentError;
use crate::metrics::{LatencyWindow, MetricsReport, RequestCounts};
use crate::types::{ExecuteRequest, ExecuteResponse, Parameters, RequestStatus, Value};

/// A locally-executed handler registered for one `(agent_type, operation)`
/// pair, consulted when the router places an operation at the edge.
#[async_trait]
pub trait EdgeHandler: Send + Sync {
    async fn handle(&self, parameters: &Parameters) -> Result<Value, AgentError>;
}

/// Result of [`Orchestrator::predict_and_prefetch`].
#[derive(Debug, Clone)]
pub struct PredictAndPrefetchResult {
    pub predictions: Vec<hybrid_predictor::Prediction>,
    pub data_keys: Vec<String>,
    pub prefetched_count: usize,
}

/// Result of [`Orchestrator::sync`], shaped by the requested direction.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Push(hybrid_sync::PushResult),
    Pull(hybrid_sync::PullResult),
    Bidirectional(hybrid_sync::BidirectionalSyncResult),
}

const TOP_K_PREDICTIONS: usize = 5;

#[derive(Default)]
struct Counters {
    total: AtomicU64,
    edge: AtomicU64,
    backend: AtomicU64,
    cache_hit: AtomicU64,
    validation_failed: AtomicU64,
    queued: AtomicU64,
    degraded: AtomicU64,
    circuit_open: AtomicU64,
    error: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> RequestCounts {
        RequestCounts {
            total: self.total.load(Ordering::Relaxed),
            edge: self.edge.load(Ordering::Relaxed),
            backend: self.backend.load(Ordering::Relaxed),
            cache_hit: self.cache_hit.load(Ordering::Relaxed),
            validation_failed: self.validation_failed.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            circuit_open: self.circuit_open.load(Ordering::Relaxed),
            error: self.error.load(Ordering::Relaxed),
        }
    }
}

struct BackendOutcome {
    success: bool,
    result: Option<Value>,
    error: Option<String>,
    retry_after: Option<std::time::Duration>,
    latency_ms: f64,
}

/// The hybrid edge/backend execution core.
///
/// Constructed once at startup from an explicit [`CoreConfig`] (there is no
/// global mutable state); every component it wires together is likewise
/// constructed from that one config tree.
pub struct Orchestrator {
    config: Arc<CoreConfig>,
    router: Router,
    predictor: Predictor,
    validator: Validator,
    sync: SyncLayer,
    cache: Cache,
    backends: DashMap<String, BackendEntry>,
    edge_handlers: DashMap<(String, String), Arc<dyn EdgeHandler>>,
    degraded_handlers: DashMap<(String, String), Arc<dyn Fn(&Parameters) -> Option<Value> + Send + Sync>>,
    fallback_store: DashMap<(String, String), Value>,
    online: AtomicBool,
    latency: LatencyWindow,
    counters: Counters,
}

impl Orchestrator {
    pub fn new(config: CoreConfig) -> Self {
        Self {
            router: Router::new(config.router.clone()),
            predictor: Predictor::new(config.predictor.clone()),
            validator: Validator::new(config.validator.clone()),
            sync: SyncLayer::new(config.sync.clone()),
            cache: Cache::new(config.cache.clone()),
            config: Arc::new(config),
            backends: DashMap::new(),
            edge_handlers: DashMap::new(),
            degraded_handlers: DashMap::new(),
            fallback_store: DashMap::new(),
            online: AtomicBool::new(true),
            latency: LatencyWindow::default(),
            counters: Counters::default(),
        }
    }

    // === Administration surface ===

    pub fn register_backend_agent(&self, agent_type: impl Into<String>, agent: Arc<dyn BackendAgent>) {
        let entry = build_backend_service(agent, &self.config.resilience);
        self.backends.insert(agent_type.into(), entry);
    }

    pub fn register_edge_handler(
        &self,
        agent_type: impl Into<String>,
        operation: impl Into<String>,
        handler: Arc<dyn EdgeHandler>,
    ) {
        self.edge_handlers.insert((agent_type.into(), operation.into()), handler);
    }

    /// Registers a per-operation degraded handler, consulted before the
    /// fallback value store when the circuit is open or the backend call
    /// otherwise fails.
    pub fn register_degraded_handler<F>(&self, agent_type: impl Into<String>, operation: impl Into<String>, handler: F)
    where
        F: Fn(&Parameters) -> Option<Value> + Send + Sync + 'static,
    {
        self.degraded_handlers.insert((agent_type.into(), operation.into()), Arc::new(handler));
    }

    /// Sets a static default value for `(agent_type, operation)`, consulted
    /// by the fallback store when no degraded handler produces a value and
    /// no prior backend success has populated it.
    pub fn set_fallback_value(&self, agent_type: impl Into<String>, operation: impl Into<String>, value: Value) {
        self.fallback_store.insert((agent_type.into(), operation.into()), value);
    }

    pub async fn force_circuit_open(&self, agent_type: &str) {
        let circuit = self.backends.get(agent_type).map(|entry| Arc::clone(&entry.circuit));
        if let Some(circuit) = circuit {
            circuit.force_open().await;
        }
    }

    pub async fn force_circuit_close(&self, agent_type: &str) {
        let circuit = self.backends.get(agent_type).map(|entry| Arc::clone(&entry.circuit));
        if let Some(circuit) = circuit {
            circuit.force_closed().await;
        }
    }

    pub async fn reset_resilience(&self, agent_type: &str) {
        let circuit = self.backends.get(agent_type).map(|entry| Arc::clone(&entry.circuit));
        if let Some(circuit) = circuit {
            circuit.reset().await;
        }
    }

    // === Cache surface ===

    pub fn cache_put(&self, namespace: &str, key: &str, value: Value, ttl: Option<std::time::Duration>, tags: &[String]) {
        self.cache.set(namespace, key, value, ttl, tags);
    }

    pub fn cache_get(&self, namespace: &str, key: &str) -> (Option<Value>, bool) {
        self.cache.get(namespace, key)
    }

    pub fn cache_invalidate_by_tag(&self, tag: &str) -> usize {
        self.cache.invalidate_by_tag(tag)
    }

    // === Prediction surface ===

    pub fn record_user_action(&self, user_id: &str, action: &str) {
        self.predictor.record_action(user_id, action);
    }

    pub fn predict_and_prefetch(&self, user_id: &str, context: Option<PredictionContext>) -> PredictAndPrefetchResult {
        let ctx = context.unwrap_or_default();
        let predictions = self.predictor.predict_next(user_id, &ctx, TOP_K_PREDICTIONS);
        let data_keys = self.predictor.prefetch(user_id, &predictions);
        let prefetched_count = data_keys.len();
        PredictAndPrefetchResult { predictions, data_keys, prefetched_count }
    }

    /// Direct access to the predictor, for registering `action -> data keys`
    /// mappings ([`Predictor::register_action_keys`]) ahead of
    /// [`Orchestrator::predict_and_prefetch`] calls.
    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    // === Sync surface ===

    /// Direct access to the sync layer, for transport wiring, resolver
    /// registration and conflict inspection beyond the [`Orchestrator::sync`]
    /// round-trip convenience call.
    pub fn sync_layer(&self) -> &SyncLayer {
        &self.sync
    }

    pub async fn sync(&self, direction: SyncDirection) -> SyncOutcome {
        match direction {
            SyncDirection::Push => SyncOutcome::Push(self.sync.push().await.unwrap_or_else(|e| hybrid_sync::PushResult {
                status: "failed",
                pushed: 0,
                error: Some(e.to_string()),
            })),
            SyncDirection::Pull => SyncOutcome::Pull(self.sync.pull().await.unwrap_or_else(|e| hybrid_sync::PullResult {
                status: "failed",
                pulled: 0,
                conflicts: 0,
                error: Some(e.to_string()),
            })),
            SyncDirection::Bidirectional => SyncOutcome::Bidirectional(self.sync.bidirectional_sync().await),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    /// Flushes any pending deltas before giving up ownership of the
    /// orchestrator; best-effort, since the push itself never fails
    /// `execute()` and shouldn't block teardown on errors either.
    pub async fn shutdown(&self) {
        if self.is_online() {
            let _ = self.sync.push().await;
        }
    }

    pub fn get_metrics(&self) -> MetricsReport {
        MetricsReport {
            requests: self.counters.snapshot(),
            latency: self.latency.percentiles(),
            cache: self.cache.get_metrics(),
            sync: self.sync.get_metrics(),
            validator_threats_blocked: self.validator.threats_blocked(),
            predictor_threshold: self.predictor.current_threshold(),
        }
    }

    // === Execution ===

    /// Runs one request through validation, the cache, routing, and (if
    /// neither short-circuits) the placed handler.
    pub async fn execute(&self, request: ExecuteRequest) -> ExecuteResponse {
        self.counters.total.fetch_add(1, Ordering::Relaxed);
        let request_id = Uuid::new_v4().to_string();
        let mut response = ExecuteResponse::new(request_id, RequestStatus::Error);

        if request.require_validation {
            if let Some(message) = self.validate_parameters(&request.parameters) {
                self.counters.validation_failed.fetch_add(1, Ordering::Relaxed);
                response.status = RequestStatus::ValidationFailed;
                response.error = Some(message);
                return response;
            }
            response.validated = true;
        }

        let cache_key = cache_key_for(&request.operation, &request.parameters);

        if request.use_cache {
            let (value, hit) = self.cache.get(&request.agent_type, &cache_key);
            if hit {
                self.counters.cache_hit.fetch_add(1, Ordering::Relaxed);
                response.status = RequestStatus::Success;
                response.result = value;
                response.cache_hit = true;
                response.execution_location = Some(ExecutionLocation::Edge);
                return response;
            }
        }

        let mut ctx = OperationContext::new(request.operation.clone());
        ctx.payload_size = request.parameters.canonical_string().len();
        let decision = self.router.decide(&request.agent_type, &request.agent_type, &ctx);

        let mut handler_ran = false;
        let mut outcome_location = decision.location;
        let mut outcome_success = false;
        let mut outcome_latency_ms = 0.0_f64;

        if decision.location == ExecutionLocation::Edge && request.allow_edge {
            let handler = self
                .edge_handlers
                .get(&(request.agent_type.clone(), request.operation.clone()))
                .map(|h| Arc::clone(h.value()));
            if let Some(handler) = handler {
                handler_ran = true;
                outcome_location = ExecutionLocation::Edge;
                let start = Instant::now();

                match handler.handle(&request.parameters).await {
                    Ok(value) => {
                        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                        outcome_latency_ms = latency_ms;
                        outcome_success = true;
                        self.latency.record(latency_ms);
                        self.counters.edge.fetch_add(1, Ordering::Relaxed);

                        if request.use_cache {
                            self.cache.set(
                                &request.agent_type,
                                &cache_key,
                                value.clone(),
                                Some(self.config.default_cache_ttl),
                                &[],
                            );
                        }
                        self.fallback_store
                            .insert((request.agent_type.clone(), request.operation.clone()), value.clone());

                        response.status = RequestStatus::Success;
                        response.execution_location = Some(ExecutionLocation::Edge);
                        response.edge_latency_ms = Some(latency_ms);
                        response.result = Some(value);
                    }
                    Err(e) => {
                        outcome_latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                        self.counters.error.fetch_add(1, Ordering::Relaxed);
                        response.status = RequestStatus::Error;
                        response.error = Some(e.to_string());
                    }
                }
            }
        }

        if !handler_ran {
            if !self.is_online() {
                let payload = serde_json::json!({
                    "operation": request.operation,
                    "parameters": request.parameters.to_json(),
                });
                let delta = self.sync.create_delta(
                    request.agent_type.clone(),
                    cache_key.clone(),
                    DeltaOperation::Update,
                    Some(payload),
                    None,
                    SyncPriority::Medium,
                );
                self.sync.queue_for_sync(delta);
                self.counters.queued.fetch_add(1, Ordering::Relaxed);
                response.status = RequestStatus::Queued;
                response.execution_location = Some(ExecutionLocation::Backend);
                return response;
            }

            handler_ran = true;
            outcome_location = ExecutionLocation::Backend;
            let outcome = self.run_backend(&request).await;
            outcome_latency_ms = outcome.latency_ms;
            outcome_success = outcome.success;
            self.latency.record(outcome.latency_ms);
            response.backend_latency_ms = Some(outcome.latency_ms);
            response.execution_location = Some(ExecutionLocation::Backend);

            if outcome.success {
                self.counters.backend.fetch_add(1, Ordering::Relaxed);
                response.status = RequestStatus::Success;
                if let Some(value) = outcome.result {
                    if request.use_cache {
                        self.cache.set(
                            &request.agent_type,
                            &cache_key,
                            value.clone(),
                            Some(self.config.default_cache_ttl),
                            &[],
                        );
                    }
                    self.fallback_store
                        .insert((request.agent_type.clone(), request.operation.clone()), value.clone());
                    response.result = Some(value);
                }
            } else if let Some(value) = self.try_degraded(&request.agent_type, &request.operation, &request.parameters) {
                self.counters.degraded.fetch_add(1, Ordering::Relaxed);
                response.status = RequestStatus::Degraded;
                response.result = Some(value);
            } else if let Some(retry_after) = outcome.retry_after {
                self.counters.circuit_open.fetch_add(1, Ordering::Relaxed);
                response.status = RequestStatus::CircuitOpen;
                response.retry_after = Some(retry_after);
                response.error = outcome.error;
            } else {
                self.counters.error.fetch_add(1, Ordering::Relaxed);
                response.status = RequestStatus::Error;
                response.error = outcome.error;
            }
        }

        if handler_ran {
            self.router.record_outcome(
                &request.agent_type,
                &request.operation,
                outcome_location,
                outcome_success,
                outcome_latency_ms,
            );
        }

        response
    }

    fn validate_parameters(&self, parameters: &Parameters) -> Option<String> {
        let mut errors = Vec::new();
        for (name, value) in parameters.iter() {
            if let Value::String(s) = value {
                let outcome = self.validator.validate(name, s, &[], true);
                if !outcome.valid {
                    errors.extend(outcome.errors);
                }
            }
        }
        if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        }
    }

    fn try_degraded(&self, agent_type: &str, operation: &str, parameters: &Parameters) -> Option<Value> {
        let key = (agent_type.to_string(), operation.to_string());
        if let Some(handler) = self.degraded_handlers.get(&key) {
            if let Some(value) = (handler.value())(parameters) {
                return Some(value);
            }
        }
        self.fallback_store.get(&key).map(|v| v.value().clone())
    }

    async fn run_backend(&self, request: &ExecuteRequest) -> BackendOutcome {
        let start = Instant::now();

        let Some((mut service, _circuit)) = self
            .backends
            .get(&request.agent_type)
            .map(|entry| (entry.service.clone(), Arc::clone(&entry.circuit)))
        else {
            return BackendOutcome {
                success: false,
                result: None,
                error: Some(crate::error::BackendError::NoAgent.to_string()),
                retry_after: None,
                latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            };
        };

        let call = BackendCall {
            agent_type: Arc::from(request.agent_type.as_str()),
            operation: Arc::from(request.operation.as_str()),
            parameters: request.parameters.clone(),
        };

        let call_result = match service.ready().await {
            Ok(ready) => ready.call(call).await,
            Err(e) => Err(e),
        };

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        match call_result {
            Ok(value) => BackendOutcome { success: true, result: Some(value), error: None, retry_after: None, latency_ms },
            Err(crate::error::BackendError::CircuitOpen { retry_after }) => BackendOutcome {
                success: false,
                result: None,
                error: Some("circuit open".to_string()),
                retry_after: Some(retry_after),
                latency_ms,
            },
            Err(other) => BackendOutcome {
                success: false,
                result: None,
                error: Some(other.to_string()),
                retry_after: None,
                latency_ms,
            },
        }
    }
}

/// Derives the cache key from the operation name and sorted parameters,
/// matching the checksum convention `hybrid_sync::checksum` uses for sync
/// payloads: a 16-character lowercase hex prefix of a SHA-256 digest.
fn cache_key_for(operation: &str, parameters: &Parameters) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    hasher.update(b"\0");
    hasher.update(parameters.canonical_string().as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..16].to_string()
}
