//! # urltype-test
//!
//! Test fixtures for urltype: sample synchronous, asynchronous, failing and
//! gated URL types, and a preconfigured [`StateRouter`](urltype_router::StateRouter)
//! with the three reference states.
//!
//! ## Modules
//!
//! - [`types`] - Sample URL types
//! - [`fixtures`] - Routing configuration and router builders

pub mod fixtures;
pub mod types;

pub use fixtures::{routing_config, sample_router, sample_router_with, sample_types, RoutingConfig};
pub use types::{AsyncTestType, FailingType, GatedType, Gates, SyncTestType};
