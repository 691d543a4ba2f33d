//! # urltype-router
//!
//! The URL type engine: named bidirectional converters between raw URL
//! segments and domain values, the resolver and aggregator that settle every
//! typed parameter before a transition completes, the representer used for
//! URL generation, and a small state router that hosts them.
//!
//! ## Modules
//!
//! - [`definition`] - The [`UrlType`] trait and compiled type definitions
//! - [`registry`] - The type registry
//! - [`builtins`] - Built-in `int`, `string`, `slug`, `uuid`, `path` and `bool` types
//! - [`resolver`] - Resolving raw segments into values
//! - [`aggregator`] - Settling all parameters of a transition
//! - [`representer`] - Representing values as segments
//! - [`pattern`] - URL templates with typed placeholders
//! - [`binder`] - Installing types into a host router
//! - [`router`] - A reference state router
//! - [`transition`] - Transition ids and supersession tracking

pub mod aggregator;
pub mod binder;
pub mod builtins;
pub mod definition;
pub mod pattern;
pub mod registry;
pub mod representer;
pub mod resolver;
pub mod router;
pub mod transition;

pub use aggregator::{ResolvedParameterSet, TransitionAggregator, TypedParam};
pub use binder::{ConfigurationBinder, ParamType, ParamTypeHost, ParamTypeTable};
pub use definition::{
    Resolution, ResolveContext, ResolveFuture, Services, TypeDefinition, UrlType,
};
pub use pattern::UrlPattern;
pub use registry::TypeRegistry;
pub use representer::Representer;
pub use resolver::{ParamDecoder, ParameterResolver};
pub use router::{
    ComponentBindings, RouterGlobals, StateDeclaration, StateRouter, TransitionOutcome,
};
pub use transition::{TransitionId, TransitionTracker};
