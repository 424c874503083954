/// Strategy for adjusting the prefetch confidence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictorStrategy {
    /// Threshold stays fixed at its configured value.
    Fixed,
    /// Threshold is raised/lowered based on recent prefetch hit rate.
    Adaptive,
}

/// Configuration for the [`Predictor`](crate::Predictor).
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    pub(crate) bigram_weight: f64,
    pub(crate) trigram_weight: f64,
    pub(crate) time_weight: f64,
    pub(crate) current_page_boost: f64,
    pub(crate) learning_window: usize,
    pub(crate) max_prefetch_items: usize,
    pub(crate) initial_threshold: f64,
    pub(crate) threshold_floor: f64,
    pub(crate) threshold_cap: f64,
    pub(crate) threshold_step: f64,
    pub(crate) adaptive_sample_size: usize,
    pub(crate) strategy: PredictorStrategy,
    pub(crate) default_prefetch_ttl_secs: u64,
}

impl PredictorConfig {
    pub fn builder() -> PredictorConfigBuilder {
        PredictorConfigBuilder::new()
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfigBuilder::new().build()
    }
}

/// Builder for [`PredictorConfig`].
pub struct PredictorConfigBuilder {
    bigram_weight: f64,
    trigram_weight: f64,
    time_weight: f64,
    current_page_boost: f64,
    learning_window: usize,
    max_prefetch_items: usize,
    initial_threshold: f64,
    threshold_floor: f64,
    threshold_cap: f64,
    threshold_step: f64,
    adaptive_sample_size: usize,
    strategy: PredictorStrategy,
    default_prefetch_ttl_secs: u64,
}

impl PredictorConfigBuilder {
    pub fn new() -> Self {
        Self {
            bigram_weight: 0.7,
            trigram_weight: 1.2,
            time_weight: 0.3,
            current_page_boost: 1.2,
            learning_window: 100,
            max_prefetch_items: 20,
            initial_threshold: 0.5,
            threshold_floor: 0.3,
            threshold_cap: 0.9,
            threshold_step: 0.05,
            adaptive_sample_size: 10,
            strategy: PredictorStrategy::Adaptive,
            default_prefetch_ttl_secs: 60,
        }
    }

    pub fn bigram_weight(mut self, weight: f64) -> Self {
        self.bigram_weight = weight;
        self
    }

    pub fn time_weight(mut self, weight: f64) -> Self {
        self.time_weight = weight;
        self
    }

    pub fn trigram_weight(mut self, weight: f64) -> Self {
        self.trigram_weight = weight;
        self
    }

    pub fn learning_window(mut self, window: usize) -> Self {
        self.learning_window = window;
        self
    }

    pub fn max_prefetch_items(mut self, max: usize) -> Self {
        self.max_prefetch_items = max;
        self
    }

    pub fn initial_threshold(mut self, threshold: f64) -> Self {
        self.initial_threshold = threshold;
        self
    }

    pub fn strategy(mut self, strategy: PredictorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn default_prefetch_ttl_secs(mut self, secs: u64) -> Self {
        self.default_prefetch_ttl_secs = secs;
        self
    }

    pub fn build(self) -> PredictorConfig {
        PredictorConfig {
            bigram_weight: self.bigram_weight,
            trigram_weight: self.trigram_weight,
            time_weight: self.time_weight,
            current_page_boost: self.current_page_boost,
            learning_window: self.learning_window,
            max_prefetch_items: self.max_prefetch_items,
            initial_threshold: self.initial_threshold,
            threshold_floor: self.threshold_floor,
            threshold_cap: self.threshold_cap,
            threshold_step: self.threshold_step,
            adaptive_sample_size: self.adaptive_sample_size,
            strategy: self.strategy,
            default_prefetch_ttl_secs: self.default_prefetch_ttl_secs,
        }
    }
}

impl Default for PredictorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Context consulted when ranking predictions.
#[derive(Debug, Clone, Default)]
pub struct PredictionContext {
    /// The user's current page/view; substring-matched against candidate
    /// action names for a confidence boost.
    pub current_page: Option<String>,
}

/// A single ranked prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub action: String,
    pub confidence: f64,
}
