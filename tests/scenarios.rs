//! Cross-component scenarios exercising the orchestrator end to end:
//! cache hit path, circuit open, sync conflict resolution, bulkhead
//! rejection, predictor prefetch, and validator injection blocking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use hybrid_edge_core::{
    AgentError, BackendAgent, CoreConfig, ExecuteRequest, Parameters, RequestStatus, ResilienceConfig,
    Value,
};
use hybrid_sync::{ConflictResolution, Delta, DeltaOperation, SyncPriority};

struct EchoAgent;

#[async_trait]
impl BackendAgent for EchoAgent {
    async fn call(&self, _operation: &str, parameters: &Parameters) -> Result<Value, AgentError> {
        Ok(parameters.get("name").cloned().unwrap_or(Value::Null))
    }
}

/// Two successive `execute()` calls with identical validated parameters and
/// caching enabled: the second is served from the cache.
#[tokio::test]
async fn cache_hit_on_second_identical_call() {
    let core = hybrid_edge_core::Orchestrator::new(CoreConfig::default());
    core.register_backend_agent("products", Arc::new(EchoAgent));

    let params = Parameters::new().with("id", "p1").with("name", "X");
    let request = || {
        ExecuteRequest::new("get_product", "products")
            .with_parameters(params.clone())
            .allow_edge(false)
    };

    let first = core.execute(request()).await;
    assert_eq!(first.status, RequestStatus::Success);
    assert!(!first.cache_hit);

    let second = core.execute(request()).await;
    assert_eq!(second.status, RequestStatus::Success);
    assert!(second.cache_hit);
    assert_eq!(second.result, first.result);
}

struct AlwaysTransient;

#[async_trait]
impl BackendAgent for AlwaysTransient {
    async fn call(&self, _operation: &str, _parameters: &Parameters) -> Result<Value, AgentError> {
        Err(AgentError::transient("backend unavailable"))
    }
}

/// After `consecutive_failure_threshold` failures the circuit opens and the
/// next call is rejected without reaching the handler.
#[tokio::test]
async fn circuit_opens_after_consecutive_failures() {
    let resilience = ResilienceConfig {
        consecutive_failure_threshold: 5,
        minimum_calls: 1,
        max_retries: 0,
        recovery_timeout: Duration::from_millis(50),
        ..ResilienceConfig::default()
    };
    let config = CoreConfig::builder().resilience(resilience).build();
    let core = hybrid_edge_core::Orchestrator::new(config);
    core.register_backend_agent("flaky", Arc::new(AlwaysTransient));

    for _ in 0..5 {
        let response = core
            .execute(ExecuteRequest::new("do_thing", "flaky").use_cache(false).allow_edge(false))
            .await;
        assert_eq!(response.status, RequestStatus::Error);
    }

    let sixth = core
        .execute(ExecuteRequest::new("do_thing", "flaky").use_cache(false).allow_edge(false))
        .await;
    assert_eq!(sixth.status, RequestStatus::CircuitOpen);
    assert!(sixth.retry_after.is_some());
}

/// A backend delta whose `old_checksum` disagrees with local state produces
/// a conflict; `ServerWins` leaves local state equal to the backend value.
#[tokio::test]
async fn conflict_server_wins_adopts_backend_state() {
    let core = hybrid_edge_core::Orchestrator::new(CoreConfig::default());
    let sync = core.sync_layer();

    sync.register_resolver("e", |_conflict| (ConflictResolution::ServerWins, None));

    let local_delta = sync.create_delta(
        "e",
        "a",
        DeltaOperation::Update,
        Some(serde_json::json!(1)),
        None,
        SyncPriority::Medium,
    );

    let incoming = Delta {
        delta_id: "backend-1".to_string(),
        entity_type: "e".to_string(),
        entity_id: "a".to_string(),
        operation: DeltaOperation::Update,
        old_version: Some(local_delta.new_version),
        new_version: 7,
        old_checksum: Some("mismatched-checksum".to_string()),
        new_checksum: "backend-checksum".to_string(),
        data: Some(serde_json::json!(2)),
        patch: None,
        priority: SyncPriority::Medium,
        timestamp: Utc::now(),
        compressed: false,
        size_bytes: 0,
    };

    let conflicts = sync.detect_conflicts(&[incoming]);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(sync.pending_conflict_count(), 1);

    let resolved = sync.auto_resolve_conflicts();
    assert!(resolved.is_empty(), "ServerWins resolves in place, nothing to re-push");
    assert_eq!(sync.pending_conflict_count(), 0);
}

struct SlowAgent;

#[async_trait]
impl BackendAgent for SlowAgent {
    async fn call(&self, _operation: &str, _parameters: &Parameters) -> Result<Value, AgentError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(serde_json::json!({"ok": true}))
    }
}

/// With `max_concurrent_calls=1` and a short queue wait, concurrent calls
/// beyond the one in-flight slot are rejected rather than admitted.
#[tokio::test]
async fn bulkhead_rejects_beyond_capacity() {
    let resilience = ResilienceConfig {
        max_concurrent_calls: 1,
        queue_timeout_ms: 10,
        ..ResilienceConfig::default()
    };
    let config = CoreConfig::builder().resilience(resilience).build();
    let core = Arc::new(hybrid_edge_core::Orchestrator::new(config));
    core.register_backend_agent("slow", Arc::new(SlowAgent));

    let rejections = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for i in 0..3 {
        let core = Arc::clone(&core);
        let rejections = Arc::clone(&rejections);
        handles.push(tokio::spawn(async move {
            let response = core
                .execute(
                    ExecuteRequest::new("do_thing", "slow")
                        .use_cache(false)
                        .allow_edge(false)
                        .with_parameters(Parameters::new().with("i", i as i64)),
                )
                .await;
            if response.status == RequestStatus::Error {
                rejections.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(rejections.load(Ordering::Relaxed) >= 1, "at least one call should overflow the bulkhead");
}

/// Recording a training sequence three times lets the predictor rank the
/// next expected action highly and prefetch its registered data key.
#[tokio::test]
async fn predictor_prefetches_registered_key() {
    let core = hybrid_edge_core::Orchestrator::new(CoreConfig::default());
    core.predictor().register_action_keys("view_item", vec!["recommend:u".to_string()], None);

    for _ in 0..3 {
        core.record_user_action("u", "view_home");
        core.record_user_action("u", "view_list");
        core.record_user_action("u", "view_item");
        core.record_user_action("u", "add_cart");
    }
    core.record_user_action("u", "view_home");
    core.record_user_action("u", "view_list");

    let result = core.predict_and_prefetch("u", None);
    assert!(
        result.predictions.iter().take(2).any(|p| p.action == "view_item" && p.confidence >= 0.5),
        "expected view_item in the top 2 predictions with confidence >= 0.5, got {:?}",
        result.predictions
    );
    assert!(result.data_keys.contains(&"recommend:u".to_string()));
    assert!(result.prefetched_count > 0);
}

/// A SQL-injection payload fails validation and increments the
/// threats-blocked metric.
#[tokio::test]
async fn validator_blocks_sql_injection() {
    let core = hybrid_edge_core::Orchestrator::new(CoreConfig::default());

    let response = core
        .execute(
            ExecuteRequest::new("search", "catalog")
                .use_cache(false)
                .allow_edge(false)
                .with_parameters(Parameters::new().with("q", "' OR 1=1 --")),
        )
        .await;

    assert_eq!(response.status, RequestStatus::ValidationFailed);
    assert_eq!(core.get_metrics().validator_threats_blocked, 1);
}
