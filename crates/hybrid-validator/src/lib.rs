//! Field validation, sanitization, and injection-pattern detection.
//!
//! The [`Validator`] combines a built-in and user-registered rule registry
//! ([`rules`]), a configurable sanitization pipeline ([`sanitize`]), and
//! security threat detection ([`security`]) behind a short-TTL result
//! [`cache`] keyed by `(field_name, value, rule set)`.

mod cache;
mod events;
mod rules;
mod sanitize;
mod security;

pub use events::ValidatorEvent;
pub use rules::ValidationRule;
pub use sanitize::{default_pipeline, sanitize as sanitize_value, SanitizeStage};
pub use security::{check_security, SecurityCheckResult, SecurityThreats};

use cache::ValidationCache;
use hybrid_resilience_core::EventListeners;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
const DEFAULT_CACHE_MAX_SIZE: usize = 10_000;

/// Result of [`Validator::validate`].
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
    /// The value after the sanitization pipeline ran, if requested.
    pub sanitized: Option<String>,
    pub threats: SecurityThreats,
}

/// Configuration for a [`Validator`].
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub name: String,
    pub cache_ttl: Duration,
    pub cache_max_size: usize,
    pub default_pipeline: Vec<SanitizeStage>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            name: "validator".to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_max_size: DEFAULT_CACHE_MAX_SIZE,
            default_pipeline: default_pipeline(),
        }
    }
}

struct ValidatorState {
    custom_rules: RwLock<HashMap<String, ValidationRule>>,
    cache: Mutex<ValidationCache<ValidationOutcome>>,
    threats_blocked: AtomicU64,
}

/// Validates, sanitizes, and screens field values.
pub struct Validator {
    config: Arc<ValidatorConfig>,
    state: Arc<ValidatorState>,
    event_listeners: EventListeners<ValidatorEvent>,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        let cache = ValidationCache::new(config.cache_ttl, config.cache_max_size);
        Self {
            config: Arc::new(config),
            state: Arc::new(ValidatorState {
                custom_rules: RwLock::new(HashMap::new()),
                cache: Mutex::new(cache),
                threats_blocked: AtomicU64::new(0),
            }),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn with_event_listeners(mut self, listeners: EventListeners<ValidatorEvent>) -> Self {
        self.event_listeners = listeners;
        self
    }

    /// Registers a custom rule under `name`, shadowing any built-in rule of
    /// the same name.
    pub fn register_rule(&self, rule: ValidationRule) {
        self.state.custom_rules.write().insert(rule.name.clone(), rule);
    }

    fn resolve_rule(&self, name: &str) -> Option<ValidationRule> {
        if let Some(rule) = self.state.custom_rules.read().get(name) {
            return Some(rule.clone());
        }
        rules::builtin_rules().into_iter().find(|r| r.name == name)
    }

    /// Validates `value` against `rule_names`, or a heuristically-guessed
    /// rule for `field_name` when `rule_names` is empty. Runs the
    /// sanitization pipeline and security screen first when `sanitize` is
    /// true, validating the sanitized value.
    pub fn validate(
        &self,
        field_name: &str,
        value: &str,
        rule_names: &[&str],
        sanitize: bool,
    ) -> ValidationOutcome {
        let signature = rule_signature(field_name, rule_names, sanitize);
        let key = cache::cache_key(field_name, value, &signature);
        let now = Instant::now();

        if let Some(cached) = self.state.cache.lock().get(key, now) {
            self.event_listeners.emit(&ValidatorEvent::CacheHit {
                pattern_name: self.config.name.clone(),
                timestamp: now,
                field_name: field_name.to_string(),
            });
            return cached;
        }

        let security = check_security(value);
        if security.threats.any() {
            self.state.threats_blocked.fetch_add(1, Ordering::Relaxed);
            self.event_listeners.emit(&ValidatorEvent::ThreatBlocked {
                pattern_name: self.config.name.clone(),
                timestamp: now,
                field_name: field_name.to_string(),
            });
        }

        let working_value = if security.threats.any() {
            security.sanitized.clone()
        } else if sanitize {
            sanitize::sanitize(value, &self.config.default_pipeline)
        } else {
            value.to_string()
        };

        let names: Vec<String> = if rule_names.is_empty() {
            rules::heuristic_rule_for_field(field_name)
                .map(|r| vec![r.to_string()])
                .unwrap_or_default()
        } else {
            rule_names.iter().map(|s| s.to_string()).collect()
        };

        let mut errors = Vec::new();
        for name in &names {
            if let Some(rule) = self.resolve_rule(name) {
                if let Some(message) = rule.check(&working_value) {
                    errors.push(message.to_string());
                }
            }
        }

        let valid = errors.is_empty() && !security.threats.any();
        let outcome = ValidationOutcome {
            valid,
            errors,
            sanitized: if sanitize || security.threats.any() {
                Some(working_value)
            } else {
                None
            },
            threats: security.threats,
        };

        self.state.cache.lock().insert(key, outcome.clone(), now);

        self.event_listeners.emit(&ValidatorEvent::Validated {
            pattern_name: self.config.name.clone(),
            timestamp: now,
            field_name: field_name.to_string(),
            valid: outcome.valid,
        });

        outcome
    }

    /// Validates multiple fields, using `rules_map` (field name -> rule
    /// names) when present, falling back to field-name heuristics.
    pub fn validate_batch(
        &self,
        fields: &HashMap<String, String>,
        rules_map: Option<&HashMap<String, Vec<&str>>>,
    ) -> HashMap<String, ValidationOutcome> {
        fields
            .iter()
            .map(|(field_name, value)| {
                let rule_names: Vec<&str> = rules_map
                    .and_then(|m| m.get(field_name))
                    .cloned()
                    .unwrap_or_default();
                let outcome = self.validate(field_name, value, &rule_names, true);
                (field_name.clone(), outcome)
            })
            .collect()
    }

    /// Runs the given sanitization stages over `value` without validating it.
    pub fn sanitize(&self, value: &str, stages: &[SanitizeStage]) -> String {
        sanitize::sanitize(value, stages)
    }

    /// Screens `value` for injection patterns without validating or
    /// sanitizing it against any rule.
    pub fn check_security(&self, value: &str) -> SecurityCheckResult {
        check_security(value)
    }

    pub fn threats_blocked(&self) -> u64 {
        self.state.threats_blocked.load(Ordering::Relaxed)
    }
}

fn rule_signature(field_name: &str, rule_names: &[&str], sanitize: bool) -> String {
    format!("{field_name}|{}|{sanitize}", rule_names.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_passes_heuristic_rule() {
        let validator = Validator::new(ValidatorConfig::default());
        let outcome = validator.validate("user_email", "user@example.com", &[], true);
        assert!(outcome.valid);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn invalid_email_fails_heuristic_rule() {
        let validator = Validator::new(ValidatorConfig::default());
        let outcome = validator.validate("user_email", "not-an-email", &[], true);
        assert!(!outcome.valid);
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn sql_injection_attempt_is_blocked_and_counted() {
        let validator = Validator::new(ValidatorConfig::default());
        let outcome = validator.validate("comment", "' OR 1=1 --", &[], true);
        assert!(!outcome.valid);
        assert!(outcome.threats.sql_injection);
        assert_eq!(validator.threats_blocked(), 1);
    }

    #[test]
    fn repeated_validation_hits_cache() {
        let validator = Validator::new(ValidatorConfig::default());
        let first = validator.validate("name", "alice", &["alphanumeric"], true);
        let second = validator.validate("name", "alice", &["alphanumeric"], true);
        assert_eq!(first.valid, second.valid);
    }

    #[test]
    fn custom_rule_shadows_builtin() {
        let validator = Validator::new(ValidatorConfig::default());
        validator.register_rule(ValidationRule::new("email", "custom").required());
        let outcome = validator.validate("contact_email", "", &["email"], true);
        assert!(!outcome.valid);
    }

    #[test]
    fn batch_validates_each_field_independently() {
        let validator = Validator::new(ValidatorConfig::default());
        let mut fields = HashMap::new();
        fields.insert("user_email".to_string(), "user@example.com".to_string());
        fields.insert("site_url".to_string(), "not a url".to_string());

        let results = validator.validate_batch(&fields, None);
        assert!(results["user_email"].valid);
        assert!(!results["site_url"].valid);
    }
}
