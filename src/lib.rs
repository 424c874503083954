//! Hybrid edge/backend execution core.
//!
//! Wires placement routing, a local cache, delta sync, action prediction,
//! input validation and the resilience stack behind one [`Orchestrator`]
//! entry point: [`Orchestrator::execute`] validates parameters, checks the
//! cache, asks the router where an operation should run, dispatches to a
//! registered edge handler or backend agent, and falls back to a degraded
//! result when the operation is offline or the backend circuit is open.
//!
//! ## Basic example
//!
//! ```no_run
//! use hybrid_edge_core::{CoreConfig, ExecuteRequest, Orchestrator};
//!
//! # async fn example() {
//! let core = Orchestrator::new(CoreConfig::default());
//! let request = ExecuteRequest::new("fetch_profile", "profile-agent");
//! let response = core.execute(request).await;
//! # let _ = response;
//! # }
//! ```

mod backend;
mod config;
mod error;
mod metrics;
mod orchestrator;
mod types;

pub use backend::BackendAgent;
pub use config::{CoreConfig, CoreConfigBuilder, ResilienceConfig, RetryBackoff};
pub use error::{AgentError, AgentErrorKind, BackendError};
pub use metrics::{LatencyPercentiles, MetricsReport, RequestCounts};
pub use orchestrator::{EdgeHandler, Orchestrator, PredictAndPrefetchResult, SyncOutcome};
pub use types::{ExecuteRequest, ExecuteResponse, ExecutionLocation, Parameters, RequestStatus, Value};

pub use hybrid_sync::SyncDirection;
