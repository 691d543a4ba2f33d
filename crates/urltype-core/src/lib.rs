//! # urltype-core
//!
//! Core types shared by every urltype crate: the error taxonomy, router
//! settings and their loaders, and the tracing-based logging setup.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Router settings and representation/mismatch policies
//! - [`settings_loader`] - Loading settings from TOML, JSON and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{BoxError, UrlTypeError, UrlTypeResult};
pub use settings::{MismatchPolicy, NullPolicy, RouterSettings};
