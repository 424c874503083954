//! Core infrastructure for hybrid-edge-core.
//!
//! This crate provides shared functionality used across all hybrid-edge-core modules:
//! - Event system for observability
//! - Metrics infrastructure
//! - Common configuration patterns
//! - Registry for managing instances

pub mod aimd;
pub mod error;
pub mod events;
#[cfg(feature = "health-integration")]
pub mod health_integration;

pub use error::ResilienceError;
pub use events::{BoxedEventListener, EventListener, EventListeners, FnListener, ResilienceEvent};
#[cfg(feature = "health-integration")]
pub use health_integration::{HealthTriggerable, SharedHealthTrigger, TriggerHealth};
