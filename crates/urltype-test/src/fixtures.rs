//! Routing configuration and router builders.
//!
//! ## Example
//!
//! ```rust
//! use urltype_test::sample_router;
//!
//! let router = sample_router().unwrap();
//! let href = router
//!     .href("sync-async", &serde_json::json!({"param1": 1, "param2": 2}))
//!     .unwrap();
//! assert_eq!(href, "#/sync-async/1/2");
//! ```

use std::sync::Arc;

use urltype_core::{RouterSettings, UrlTypeResult};
use urltype_router::{Services, StateDeclaration, StateRouter, UrlType};

use crate::types::{AsyncTestType, FailingType, GatedType, SyncTestType};

/// States plus the router settings they are served with.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// State declarations, in registration order.
    pub states: Vec<StateDeclaration>,
    /// Router settings.
    pub settings: RouterSettings,
}

/// Returns the reference configuration: hash URLs and the states
///
/// - `sync` at `/sync/{param1:SyncTest}`
/// - `async` at `/async/{param1:AsyncTest}`
/// - `sync-async` at `/sync-async/{param1:SyncTest}/{param2:AsyncTest}`
/// - `failing` at `/failing/{param1:SyncTest}/{param2:Failing}`
/// - `gated` at `/gated/{param1:Gated}`
pub fn routing_config() -> RoutingConfig {
    RoutingConfig {
        states: vec![
            StateDeclaration::new("sync", "/sync/{param1:SyncTest}", "SyncTestComponent"),
            StateDeclaration::new("async", "/async/{param1:AsyncTest}", "AsyncTestComponent"),
            StateDeclaration::new(
                "sync-async",
                "/sync-async/{param1:SyncTest}/{param2:AsyncTest}",
                "SyncAsyncTestComponent",
            ),
            StateDeclaration::new(
                "failing",
                "/failing/{param1:SyncTest}/{param2:Failing}",
                "FailingTestComponent",
            ),
            StateDeclaration::new("gated", "/gated/{param1:Gated}", "GatedTestComponent"),
        ],
        settings: RouterSettings {
            use_hash: true,
            ..RouterSettings::default()
        },
    }
}

/// Returns every sample type.
pub fn sample_types() -> Vec<Arc<dyn UrlType>> {
    vec![
        Arc::new(SyncTestType),
        Arc::new(AsyncTestType),
        Arc::new(FailingType),
        Arc::new(GatedType),
    ]
}

/// Builds a router from [`routing_config`] with every sample type installed.
///
/// # Errors
///
/// Propagates configuration errors; none are expected for the fixtures.
pub fn sample_router() -> UrlTypeResult<StateRouter> {
    sample_router_with(Services::new())
}

/// Like [`sample_router`], with `services` available to resolves.
///
/// # Errors
///
/// Propagates configuration errors; none are expected for the fixtures.
pub fn sample_router_with(services: Services) -> UrlTypeResult<StateRouter> {
    let config = routing_config();
    let mut router = StateRouter::configure(config.settings, sample_types(), services)?;
    for state in config.states {
        router.register_state(state)?;
    }
    Ok(router)
}
