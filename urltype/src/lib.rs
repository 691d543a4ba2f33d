//! # urltype
//!
//! Typed URL parameters for client-side routers.
//!
//! This is the meta-crate that re-exports the urltype sub-crates. Depend on
//! `urltype` for everything, or on individual crates for finer-grained control.
//!
//! ```
//! use urltype::core::RouterSettings;
//! use urltype::router::{Services, StateDeclaration, StateRouter};
//!
//! let mut router = StateRouter::configure(RouterSettings::default(), Vec::new(), Services::new())?;
//! router.register_state(StateDeclaration::new("article", "/articles/{slug:slug}", "Article"))?;
//! assert_eq!(
//!     router.href("article", &urltype::serde_json::json!({"slug": "hello"}))?,
//!     "#/articles/hello"
//! );
//! # Ok::<(), urltype::core::UrlTypeError>(())
//! ```

/// Errors, settings, settings loading and logging.
pub use urltype_core as core;

/// Url types, the registry, resolution, representation and the state router.
#[cfg(feature = "router")]
pub use urltype_router as router;

/// Sample url types and preconfigured routers for tests.
#[cfg(feature = "testing")]
pub use urltype_test as test;

pub use serde_json;
pub use tracing;
