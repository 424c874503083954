/// Where an operation should execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionLocation {
    Edge,
    Backend,
    Hybrid,
}

/// Routing strategy used when no earlier rule in the decision chain fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingStrategy {
    /// Weight edge-vs-backend by observed success rate and latency.
    Adaptive,
    /// Bias toward Edge whenever either path is viable.
    PrivacyFirst,
    /// Pick the path with lower recent P95 latency.
    LatencyOptimized,
    /// Prefer Edge unless an explicit backend-only rule fires.
    CostOptimized,
}

/// A user-expressed preference for where an operation should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementPreference {
    Edge,
    Backend,
}

/// Request-scoped flags and metadata consulted by the decision rule chain.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    pub operation: String,
    pub payload_size: usize,
    pub requires_gpu: bool,
    pub requires_llm: bool,
    pub privacy_sensitive: bool,
    pub latency_critical: bool,
    pub bandwidth_limited: bool,
    pub network_available: bool,
    pub user_preference: Option<PlacementPreference>,
}

impl OperationContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            network_available: true,
            ..Default::default()
        }
    }
}

/// Configuration for the [`Router`](crate::Router).
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub(crate) name: String,
    pub(crate) strategy: RoutingStrategy,
    /// Payload size (bytes) above which rule 7 forces `Backend`.
    pub(crate) backend_threshold_bytes: usize,
    /// Number of (agent_type, operation, location) outcome records retained per bucket.
    pub(crate) max_history_per_bucket: usize,
    /// Smoothing factor for the exponential moving averages.
    pub(crate) ema_alpha: f64,
}

impl RouterConfig {
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::new()
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfigBuilder::new().build()
    }
}

/// Builder for [`RouterConfig`].
pub struct RouterConfigBuilder {
    name: String,
    strategy: RoutingStrategy,
    backend_threshold_bytes: usize,
    max_history_per_bucket: usize,
    ema_alpha: f64,
}

impl RouterConfigBuilder {
    pub fn new() -> Self {
        Self {
            name: "router".to_string(),
            strategy: RoutingStrategy::Adaptive,
            backend_threshold_bytes: 100 * 1024,
            max_history_per_bucket: 10_000,
            ema_alpha: 0.2,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn strategy(mut self, strategy: RoutingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn backend_threshold_bytes(mut self, bytes: usize) -> Self {
        self.backend_threshold_bytes = bytes;
        self
    }

    pub fn max_history_per_bucket(mut self, max: usize) -> Self {
        self.max_history_per_bucket = max;
        self
    }

    pub fn ema_alpha(mut self, alpha: f64) -> Self {
        self.ema_alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> RouterConfig {
        RouterConfig {
            name: self.name,
            strategy: self.strategy,
            backend_threshold_bytes: self.backend_threshold_bytes,
            max_history_per_bucket: self.max_history_per_bucket,
            ema_alpha: self.ema_alpha,
        }
    }
}

impl Default for RouterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
