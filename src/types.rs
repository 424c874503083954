//! The typed request/response envelope exchanged with [`crate::Orchestrator::execute`].
//!
//! Operation arguments are a `Parameters` map keyed by string to a tagged
//! [`serde_json::Value`] rather than an untyped bag of keyword arguments;
//! the map is a `BTreeMap` so iteration order is already the sorted order
//! the cache key hash requires.

use std::collections::BTreeMap;
use std::time::Duration;

pub use hybrid_router::ExecutionLocation;

/// A tagged value carried through `Parameters` and handler results.
pub type Value = serde_json::Value;

/// Operation arguments, keyed by name. Iteration is in sorted key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(BTreeMap<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Renders the parameters as a JSON object, e.g. for embedding in a
    /// sync delta payload.
    pub(crate) fn to_json(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// A stable string representation of the sorted map, used as the
    /// hashing input for the cache key.
    pub(crate) fn canonical_string(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.0 {
            out.push_str(k);
            out.push('=');
            out.push_str(&v.to_string());
            out.push(';');
        }
        out
    }
}

impl FromIterator<(String, Value)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The outcome of one [`crate::Orchestrator::execute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Success,
    ValidationFailed,
    Queued,
    CircuitOpen,
    Degraded,
    Error,
}

/// One call into the orchestrator.
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub operation: String,
    pub agent_type: String,
    pub parameters: Parameters,
    pub user_id: Option<String>,
    pub require_validation: bool,
    pub use_cache: bool,
    pub allow_edge: bool,
    pub timeout_ms: Option<u64>,
}

impl ExecuteRequest {
    pub fn new(operation: impl Into<String>, agent_type: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            agent_type: agent_type.into(),
            parameters: Parameters::new(),
            user_id: None,
            require_validation: true,
            use_cache: true,
            allow_edge: true,
            timeout_ms: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn require_validation(mut self, require: bool) -> Self {
        self.require_validation = require;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn allow_edge(mut self, allow_edge: bool) -> Self {
        self.allow_edge = allow_edge;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// The result of [`crate::Orchestrator::execute`].
#[derive(Debug, Clone)]
pub struct ExecuteResponse {
    pub request_id: String,
    pub status: RequestStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub execution_location: Option<ExecutionLocation>,
    pub edge_latency_ms: Option<f64>,
    pub backend_latency_ms: Option<f64>,
    pub cache_hit: bool,
    pub validated: bool,
    /// Set on `CircuitOpen`: hint for when the caller may retry.
    pub retry_after: Option<Duration>,
}

impl ExecuteResponse {
    pub(crate) fn new(request_id: String, status: RequestStatus) -> Self {
        Self {
            request_id,
            status,
            result: None,
            error: None,
            execution_location: None,
            edge_latency_ms: None,
            backend_latency_ms: None,
            cache_hit: false,
            validated: false,
            retry_after: None,
        }
    }
}
