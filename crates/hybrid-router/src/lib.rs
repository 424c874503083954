//! Edge/backend placement decisions.
//!
//! The [`Router`] evaluates a fixed-order decision rule chain for each
//! routing request, falling back to a configurable [`RoutingStrategy`] when
//! no earlier rule fires. Outcomes recorded after dispatch feed per-bucket
//! exponential moving averages that the `Adaptive` and `LatencyOptimized`
//! strategies consult.

mod config;
mod events;
mod stats;

pub use config::{
    ExecutionLocation, OperationContext, PlacementPreference, RouterConfig, RouterConfigBuilder,
    RoutingStrategy,
};
pub use events::RouterEvent;

use hybrid_resilience_core::EventListeners;
use parking_lot::RwLock;
use stats::StatsTable;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// The outcome of the decision rule chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    pub location: ExecutionLocation,
    pub reason: &'static str,
    /// Confidence score in `[0, 1]` backing the decision; 1.0 for rules that
    /// fire deterministically, strategy-dependent for the fallback rule.
    pub score: f64,
}

struct RouterState {
    overrides: RwLock<HashMap<(String, String), ExecutionLocation>>,
    stats: RwLock<StatsTable>,
    unhealthy_backends: RwLock<HashSet<String>>,
}

/// Produces placement decisions and adapts to observed call outcomes.
pub struct Router {
    config: Arc<RouterConfig>,
    state: Arc<RouterState>,
    event_listeners: EventListeners<RouterEvent>,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(RouterState {
                overrides: RwLock::new(HashMap::new()),
                stats: RwLock::new(StatsTable::default()),
                unhealthy_backends: RwLock::new(HashSet::new()),
            }),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn with_event_listeners(mut self, listeners: EventListeners<RouterEvent>) -> Self {
        self.event_listeners = listeners;
        self
    }

    /// Registers a static placement override consulted before any other rule
    /// (decision rule 1). Later calls for the same key replace the prior one.
    pub fn register_override(
        &self,
        agent_type: impl Into<String>,
        operation: impl Into<String>,
        location: ExecutionLocation,
    ) {
        self.state
            .overrides
            .write()
            .insert((agent_type.into(), operation.into()), location);
    }

    /// Marks the backend unhealthy: any `Hybrid` decision is forced to `Edge`
    /// until [`mark_healthy`](Self::mark_healthy) is called.
    pub fn mark_unhealthy(&self, backend: impl Into<String>) {
        let backend = backend.into();
        self.state.unhealthy_backends.write().insert(backend);
        self.event_listeners.emit(&RouterEvent::MarkedUnhealthy {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
        });
    }

    pub fn mark_healthy(&self, backend: &str) {
        self.state.unhealthy_backends.write().remove(backend);
        self.event_listeners.emit(&RouterEvent::MarkedHealthy {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
        });
    }

    pub fn is_unhealthy(&self, backend: &str) -> bool {
        self.state.unhealthy_backends.read().contains(backend)
    }

    /// Evaluates the decision rule chain for one routing request.
    ///
    /// `backend` identifies the backend endpoint consulted by rule 9's health
    /// interaction; pass the same string used with [`mark_unhealthy`](Self::mark_unhealthy).
    pub fn decide(
        &self,
        agent_type: &str,
        backend: &str,
        ctx: &OperationContext,
    ) -> RoutingDecision {
        let decision = self.evaluate_rules(agent_type, backend, ctx);

        self.event_listeners.emit(&RouterEvent::DecisionMade {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            agent_type: agent_type.to_string(),
            operation: ctx.operation.clone(),
            location: decision.location,
            reason: decision.reason,
        });

        decision
    }

    fn evaluate_rules(
        &self,
        agent_type: &str,
        backend: &str,
        ctx: &OperationContext,
    ) -> RoutingDecision {
        // Rule 1: explicit per-operation override.
        if let Some(&location) = self
            .state
            .overrides
            .read()
            .get(&(agent_type.to_string(), ctx.operation.clone()))
        {
            return RoutingDecision {
                location,
                reason: "explicit_override",
                score: 1.0,
            };
        }

        // Rule 2: user preference.
        if let Some(pref) = ctx.user_preference {
            let location = match pref {
                PlacementPreference::Edge => ExecutionLocation::Edge,
                PlacementPreference::Backend => ExecutionLocation::Backend,
            };
            return RoutingDecision {
                location,
                reason: "user_preference",
                score: 1.0,
            };
        }

        // Rule 3: privacy sensitive.
        if ctx.privacy_sensitive {
            return RoutingDecision {
                location: ExecutionLocation::Edge,
                reason: "privacy_sensitive",
                score: 1.0,
            };
        }

        // Rule 4: latency critical.
        if ctx.latency_critical {
            return RoutingDecision {
                location: ExecutionLocation::Edge,
                reason: "latency_critical",
                score: 1.0,
            };
        }

        // Rule 5: network unavailable.
        if !ctx.network_available {
            return RoutingDecision {
                location: ExecutionLocation::Edge,
                reason: "network_unavailable",
                score: 1.0,
            };
        }

        // Rule 6: requires GPU or LLM.
        if ctx.requires_gpu || ctx.requires_llm {
            return RoutingDecision {
                location: ExecutionLocation::Backend,
                reason: "requires_gpu_or_llm",
                score: 1.0,
            };
        }

        // Rule 7: payload too large.
        if ctx.payload_size > self.config.backend_threshold_bytes {
            return RoutingDecision {
                location: ExecutionLocation::Backend,
                reason: "payload_too_large",
                score: 1.0,
            };
        }

        // Rule 8: bandwidth limited.
        if ctx.bandwidth_limited {
            return RoutingDecision {
                location: ExecutionLocation::Edge,
                reason: "bandwidth_limited",
                score: 1.0,
            };
        }

        // Rule 9: strategy-dependent default.
        let mut decision = self.strategy_default(agent_type, ctx);

        // Health interaction: force Edge for Hybrid decisions while unhealthy.
        if decision.location == ExecutionLocation::Hybrid && self.is_unhealthy(backend) {
            decision = RoutingDecision {
                location: ExecutionLocation::Edge,
                reason: "backend_unhealthy",
                score: decision.score,
            };
        }

        decision
    }

    fn strategy_default(&self, agent_type: &str, ctx: &OperationContext) -> RoutingDecision {
        match self.config.strategy {
            RoutingStrategy::PrivacyFirst => RoutingDecision {
                location: ExecutionLocation::Edge,
                reason: "strategy_privacy_first",
                score: 0.9,
            },
            RoutingStrategy::CostOptimized => RoutingDecision {
                location: ExecutionLocation::Edge,
                reason: "strategy_cost_optimized",
                score: 0.8,
            },
            RoutingStrategy::LatencyOptimized => {
                let stats = self.state.stats.read();
                let edge_latency = stats
                    .get(agent_type, &ctx.operation, ExecutionLocation::Edge)
                    .map(|s| s.latency_ema_ms);
                let backend_latency = stats
                    .get(agent_type, &ctx.operation, ExecutionLocation::Backend)
                    .map(|s| s.latency_ema_ms);

                match (edge_latency, backend_latency) {
                    (Some(e), Some(b)) if b < e => RoutingDecision {
                        location: ExecutionLocation::Backend,
                        reason: "strategy_latency_optimized",
                        score: 0.7,
                    },
                    (Some(_), _) => RoutingDecision {
                        location: ExecutionLocation::Edge,
                        reason: "strategy_latency_optimized",
                        score: 0.7,
                    },
                    _ => RoutingDecision {
                        location: ExecutionLocation::Hybrid,
                        reason: "strategy_latency_optimized_no_data",
                        score: 0.5,
                    },
                }
            }
            RoutingStrategy::Adaptive => {
                let stats = self.state.stats.read();
                let edge = stats.get(agent_type, &ctx.operation, ExecutionLocation::Edge);
                let backend = stats.get(agent_type, &ctx.operation, ExecutionLocation::Backend);

                match (edge, backend) {
                    (Some(e), Some(b)) => {
                        let edge_score = e.success_ema * 0.7 + (1.0 - normalize_latency(e.latency_ema_ms)) * 0.3;
                        let backend_score =
                            b.success_ema * 0.7 + (1.0 - normalize_latency(b.latency_ema_ms)) * 0.3;

                        if edge_score >= backend_score {
                            RoutingDecision {
                                location: ExecutionLocation::Edge,
                                reason: "strategy_adaptive",
                                score: edge_score,
                            }
                        } else {
                            RoutingDecision {
                                location: ExecutionLocation::Backend,
                                reason: "strategy_adaptive",
                                score: backend_score,
                            }
                        }
                    }
                    _ => RoutingDecision {
                        location: ExecutionLocation::Hybrid,
                        reason: "strategy_adaptive_no_data",
                        score: 0.5,
                    },
                }
            }
        }
    }

    /// Updates per-(agent_type, operation, location) outcome EMAs.
    pub fn record_outcome(
        &self,
        agent_type: &str,
        operation: &str,
        location: ExecutionLocation,
        success: bool,
        latency_ms: f64,
    ) {
        self.state.stats.write().record(
            agent_type,
            operation,
            location,
            success,
            latency_ms,
            self.config.ema_alpha,
            self.config.max_history_per_bucket,
        );

        self.event_listeners.emit(&RouterEvent::OutcomeRecorded {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            agent_type: agent_type.to_string(),
            operation: operation.to_string(),
            location,
            success,
        });
    }
}

/// Normalizes a latency value (milliseconds) into `[0, 1]` for blending with
/// success rate; latencies beyond `cap_ms` saturate at 1.0.
fn normalize_latency(latency_ms: f64) -> f64 {
    const CAP_MS: f64 = 1000.0;
    (latency_ms / CAP_MS).clamp(0.0, 1.0)
}
