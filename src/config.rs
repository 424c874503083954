//! The aggregated configuration tree for an [`crate::Orchestrator`].
//!
//! Each component keeps its own config type with its own defaults; this
//! module only adds the knobs that live at the orchestrator level itself
//! (cache TTL, the fixed resilience-stack parameters) and wires a
//! `CoreConfig::default()` that matches every component's documented
//! defaults, per the configuration surface's "missing knobs inherit
//! documented defaults" rule.

use std::time::Duration;

use hybrid_cache::CacheConfig;
use hybrid_predictor::PredictorConfig;
use hybrid_router::RouterConfig;
use hybrid_sync::SyncConfig;
use hybrid_validator::ValidatorConfig;

/// Backoff strategy for the retry stage of the resilience stack.
#[derive(Debug, Clone, Copy)]
pub enum RetryBackoff {
    Fixed(Duration),
    Exponential(Duration),
    ExponentialWithJitter(Duration),
}

/// Parameters for the fixed Bulkhead -> CircuitBreaker -> Retry -> Timeout
/// resilience stack built once per registered `agent_type`.
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub failure_rate_threshold: f64,
    pub consecutive_failure_threshold: usize,
    pub minimum_calls: usize,
    pub window_time_seconds: u64,
    pub recovery_timeout: Duration,
    pub half_open_max_calls: usize,
    pub max_retries: usize,
    pub retry_backoff: RetryBackoff,
    pub max_retry_delay_ms: u64,
    pub call_timeout: Duration,
    pub max_concurrent_calls: usize,
    /// Upper bound on in-flight + queued calls the bulkhead admits; the
    /// underlying semaphore has no separate bounded-queue-length concept
    /// beyond `queue_timeout_ms`'s wait, so this is advisory and surfaced
    /// only in metrics, not enforced as a second limit.
    pub max_queue_size: usize,
    pub queue_timeout_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            consecutive_failure_threshold: 5,
            minimum_calls: 10,
            window_time_seconds: 60,
            recovery_timeout: Duration::from_secs(30),
            half_open_max_calls: 3,
            max_retries: 2,
            retry_backoff: RetryBackoff::ExponentialWithJitter(Duration::from_millis(100)),
            max_retry_delay_ms: 5_000,
            call_timeout: Duration::from_secs(10),
            max_concurrent_calls: 25,
            max_queue_size: 25,
            queue_timeout_ms: 10,
        }
    }
}

/// The full configuration tree for an [`crate::Orchestrator`].
#[derive(Clone)]
pub struct CoreConfig {
    pub router: RouterConfig,
    pub cache: CacheConfig,
    pub predictor: PredictorConfig,
    pub validator: ValidatorConfig,
    pub sync: SyncConfig,
    pub resilience: ResilienceConfig,
    /// Default TTL applied when a backend result is cached (spec default 300s).
    pub default_cache_ttl: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            router: RouterConfig::default(),
            cache: CacheConfig::default(),
            predictor: PredictorConfig::default(),
            validator: ValidatorConfig::default(),
            sync: SyncConfig::builder("local-node").build(),
            resilience: ResilienceConfig::default(),
            default_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }
}

/// Builder for [`CoreConfig`]; each setter takes an already-built
/// component config since every component already has its own builder.
#[derive(Default)]
pub struct CoreConfigBuilder {
    inner: Option<CoreConfig>,
}

impl CoreConfigBuilder {
    fn base(&mut self) -> CoreConfig {
        self.inner.take().unwrap_or_default()
    }

    pub fn router(mut self, router: RouterConfig) -> Self {
        let mut core = self.base();
        core.router = router;
        self.inner = Some(core);
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        let mut core = self.base();
        core.cache = cache;
        self.inner = Some(core);
        self
    }

    pub fn predictor(mut self, predictor: PredictorConfig) -> Self {
        let mut core = self.base();
        core.predictor = predictor;
        self.inner = Some(core);
        self
    }

    pub fn validator(mut self, validator: ValidatorConfig) -> Self {
        let mut core = self.base();
        core.validator = validator;
        self.inner = Some(core);
        self
    }

    pub fn sync(mut self, sync: SyncConfig) -> Self {
        let mut core = self.base();
        core.sync = sync;
        self.inner = Some(core);
        self
    }

    pub fn resilience(mut self, resilience: ResilienceConfig) -> Self {
        let mut core = self.base();
        core.resilience = resilience;
        self.inner = Some(core);
        self
    }

    pub fn default_cache_ttl(mut self, ttl: Duration) -> Self {
        let mut core = self.base();
        core.default_cache_ttl = ttl;
        self.inner = Some(core);
        self
    }

    pub fn build(mut self) -> CoreConfig {
        self.base()
    }
}
