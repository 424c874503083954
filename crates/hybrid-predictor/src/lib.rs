//! Action prediction and bounded prefetch.
//!
//! The [`Predictor`] learns per-user bigram/trigram action transitions and
//! hour-of-day/day-of-week activity histograms, ranks candidate next
//! actions, and maintains a capacity-bounded prefetch slot per user fed by
//! an (action -> data keys) registry.

mod config;
mod events;
mod history;
mod prefetch;

pub use config::{
    PredictionContext, Prediction, PredictorConfig, PredictorConfigBuilder, PredictorStrategy,
};
pub use events::PredictorEvent;

use chrono::Utc;
use history::UserHistory;
use hybrid_resilience_core::EventListeners;
use parking_lot::RwLock;
use prefetch::PrefetchSlot;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct ActionKeyMapping {
    keys: Vec<String>,
    ttl: Duration,
}

struct PredictorState {
    histories: RwLock<HashMap<String, UserHistory>>,
    prefetch_slots: RwLock<HashMap<String, PrefetchSlot>>,
    action_keys: RwLock<HashMap<String, ActionKeyMapping>>,
    threshold: RwLock<f64>,
    recent_outcomes: RwLock<VecDeque<bool>>,
}

/// Predicts a user's next action and prefetches the data it is likely to need.
pub struct Predictor {
    config: Arc<PredictorConfig>,
    state: Arc<PredictorState>,
    event_listeners: EventListeners<PredictorEvent>,
}

impl Predictor {
    pub fn new(config: PredictorConfig) -> Self {
        let threshold = config.initial_threshold;
        Self {
            config: Arc::new(config),
            state: Arc::new(PredictorState {
                histories: RwLock::new(HashMap::new()),
                prefetch_slots: RwLock::new(HashMap::new()),
                action_keys: RwLock::new(HashMap::new()),
                threshold: RwLock::new(threshold),
                recent_outcomes: RwLock::new(VecDeque::new()),
            }),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn with_event_listeners(mut self, listeners: EventListeners<PredictorEvent>) -> Self {
        self.event_listeners = listeners;
        self
    }

    /// Registers the data keys that should be prefetched when `action` is predicted.
    pub fn register_action_keys(
        &self,
        action: impl Into<String>,
        keys: Vec<String>,
        ttl: Option<Duration>,
    ) {
        self.state.action_keys.write().insert(
            action.into(),
            ActionKeyMapping {
                keys,
                ttl: ttl.unwrap_or_else(|| Duration::from_secs(self.config.default_prefetch_ttl_secs)),
            },
        );
    }

    /// Records an observed user action, updating transition tables and
    /// time-of-day histograms.
    pub fn record_action(&self, user_id: &str, action: &str) {
        let now = Utc::now();
        let mut histories = self.state.histories.write();
        histories
            .entry(user_id.to_string())
            .or_default()
            .record(action, now, self.config.learning_window);
    }

    /// Ranks candidate next actions for `user_id`, returning the top `k`.
    pub fn predict_next(&self, user_id: &str, ctx: &PredictionContext, k: usize) -> Vec<Prediction> {
        let histories = self.state.histories.read();
        let Some(history) = histories.get(user_id) else {
            return Vec::new();
        };

        let Some(last) = history.last_action().map(|s| s.to_string()) else {
            return Vec::new();
        };

        let prev_last = history.last_two_actions().map(|(p, l)| (p.to_string(), l.to_string()));

        let mut candidates: HashSet<String> = history.bigram_candidates(&last).into_iter().collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let now = Utc::now();
        let time_score = history.time_score(now) * self.config.time_weight;
        let max_score = self.config.bigram_weight + self.config.trigram_weight + self.config.time_weight;

        let mut ranked: Vec<Prediction> = candidates
            .drain()
            .map(|candidate| {
                let bigram_score = history
                    .bigram_prob(&last, &candidate)
                    .unwrap_or(0.0)
                    * self.config.bigram_weight;

                let trigram_score = prev_last
                    .as_ref()
                    .and_then(|(prev, last)| history.trigram_prob(prev, last, &candidate))
                    .map(|p| p * self.config.trigram_weight)
                    .unwrap_or(0.0);

                let mut score = (bigram_score + trigram_score + time_score) / max_score;

                if let Some(page) = &ctx.current_page {
                    if !page.is_empty() && (page.contains(&candidate) || candidate.contains(page.as_str())) {
                        score *= self.config.current_page_boost;
                    }
                }

                Prediction {
                    action: candidate,
                    confidence: score.clamp(0.0, 1.0),
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);

        self.event_listeners.emit(&PredictorEvent::Predicted {
            pattern_name: "predictor".to_string(),
            timestamp: Instant::now(),
            user_id: user_id.to_string(),
            candidate_count: ranked.len(),
        });

        ranked
    }

    /// Stores the data keys for every prediction at or above the current
    /// threshold, evicting within each user's slot as needed. Returns the
    /// full set of keys newly added across all qualifying predictions.
    pub fn prefetch(&self, user_id: &str, predictions: &[Prediction]) -> Vec<String> {
        let threshold = *self.state.threshold.read();
        let action_keys = self.state.action_keys.read();
        let mut slots = self.state.prefetch_slots.write();
        let slot = slots.entry(user_id.to_string()).or_default();

        let now = Instant::now();
        let mut newly_added = Vec::new();

        for prediction in predictions {
            if prediction.confidence < threshold {
                continue;
            }
            let Some(mapping) = action_keys.get(&prediction.action) else {
                continue;
            };
            for key in &mapping.keys {
                let is_new = slot.insert(
                    key.clone(),
                    prediction.confidence,
                    mapping.ttl,
                    self.config.max_prefetch_items,
                    now,
                );
                if is_new {
                    newly_added.push(key.clone());
                }
            }
        }

        if !newly_added.is_empty() {
            self.event_listeners.emit(&PredictorEvent::Prefetched {
                pattern_name: "predictor".to_string(),
                timestamp: Instant::now(),
                user_id: user_id.to_string(),
                key_count: newly_added.len(),
            });
        }

        newly_added
    }

    pub fn is_prefetched(&self, user_id: &str, key: &str) -> bool {
        self.state
            .prefetch_slots
            .read()
            .get(user_id)
            .map(|slot| slot.contains(key))
            .unwrap_or(false)
    }

    /// Records whether a prefetched key was actually used, feeding the
    /// adaptive threshold evaluator (strategy = `Adaptive`).
    pub fn record_prefetch_outcome(&self, user_id: &str, key: &str, hit: bool) {
        if let Some(slot) = self.state.prefetch_slots.write().get_mut(user_id) {
            if hit {
                slot.mark_used(key);
            }
        }

        if self.config.strategy != PredictorStrategy::Adaptive {
            return;
        }

        let mut outcomes = self.state.recent_outcomes.write();
        outcomes.push_back(hit);
        while outcomes.len() > self.config.adaptive_sample_size {
            outcomes.pop_front();
        }

        if outcomes.len() >= self.config.adaptive_sample_size {
            let hit_rate = outcomes.iter().filter(|&&h| h).count() as f64 / outcomes.len() as f64;
            outcomes.clear();
            drop(outcomes);
            self.adjust_threshold(hit_rate);
        }
    }

    fn adjust_threshold(&self, hit_rate: f64) {
        let mut threshold = self.state.threshold.write();
        let step = self.config.threshold_step;

        if hit_rate < 0.5 {
            *threshold = (*threshold + step).min(self.config.threshold_cap);
        } else if hit_rate > 0.7 {
            *threshold = (*threshold - step).max(self.config.threshold_floor);
        }

        let new_threshold = *threshold;
        drop(threshold);

        self.event_listeners.emit(&PredictorEvent::ThresholdAdjusted {
            pattern_name: "predictor".to_string(),
            timestamp: Instant::now(),
            new_threshold,
        });
    }

    pub fn current_threshold(&self) -> f64 {
        *self.state.threshold.read()
    }
}
