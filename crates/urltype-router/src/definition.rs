//! URL type definitions.
//!
//! A URL type converts between a raw URL segment and a domain value. Types
//! implement the [`UrlType`] trait and are registered as [`TypeDefinition`]s,
//! which pair the user implementation with its compiled match pattern.
//!
//! Resolving may complete synchronously or asynchronously. Both cases are
//! expressed through [`Resolution`], which always converts into the same
//! [`ResolveFuture`] so callers never inspect how the value arrived.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use regex::Regex;
use serde_json::Value;

use urltype_core::{BoxError, UrlTypeError, UrlTypeResult};

use crate::transition::TransitionId;

/// The uniform awaitable produced by every resolve, ready or not.
pub type ResolveFuture = BoxFuture<'static, Result<Value, BoxError>>;

/// The outcome of calling [`UrlType::resolve`].
///
/// `Ready` covers types that decode without suspending; `Pending` covers
/// types that perform a lookup.
pub enum Resolution {
    /// The value (or failure) is available immediately.
    Ready(Result<Value, BoxError>),
    /// The value will be available once the future completes.
    Pending(ResolveFuture),
}

impl Resolution {
    /// An immediately resolved value.
    pub const fn ready(value: Value) -> Self {
        Self::Ready(Ok(value))
    }

    /// An immediate failure.
    pub fn failed(error: impl Into<BoxError>) -> Self {
        Self::Ready(Err(error.into()))
    }

    /// A value produced by a future.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }

    /// Returns `true` if no suspension is needed to obtain the result.
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Converts into the uniform future type.
    pub fn into_future(self) -> ResolveFuture {
        match self {
            Self::Ready(result) => future::ready(result).boxed(),
            Self::Pending(fut) => fut,
        }
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(Ok(value)) => f.debug_tuple("Ready").field(value).finish(),
            Self::Ready(Err(e)) => f.debug_tuple("Failed").field(&e.to_string()).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Collaborators made available to resolve implementations, keyed by type.
///
/// This is how a type reaches a lookup client or cache without global state.
///
/// # Examples
///
/// ```
/// use urltype_router::definition::Services;
///
/// struct ArticleClient { base: &'static str }
///
/// let mut services = Services::new();
/// services.insert(ArticleClient { base: "https://example.com" });
/// assert_eq!(services.get::<ArticleClient>().unwrap().base, "https://example.com");
/// assert!(services.get::<String>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Services {
    inner: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Services {
    /// Creates an empty service map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service, replacing any previous service of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, service: T) {
        Arc::make_mut(&mut self.inner).insert(TypeId::of::<T>(), Arc::new(service));
    }

    /// Returns the service of type `T`, if one was inserted.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.inner
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|service| service.downcast::<T>().ok())
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if no services are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("len", &self.inner.len())
            .finish()
    }
}

/// What a resolve implementation knows about the parameter it is decoding.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// The parameter name, as declared in the URL template.
    pub param: String,
    /// The transition the resolution belongs to.
    pub transition: TransitionId,
    /// Collaborators configured on the router.
    pub services: Services,
}

/// A user-supplied bidirectional converter between URL segments and values.
///
/// `represent` must be pure and synchronous. Representations may be lossy
/// (e.g. only a primary key), but resolving a representation must yield a
/// value that represents to the same string.
pub trait UrlType: Send + Sync + fmt::Debug {
    /// The unique, case-sensitive name used in templates (`{param:Name}`).
    fn name(&self) -> &str;

    /// The regular expression a raw segment must fully match.
    fn pattern(&self) -> &str;

    /// Whether resolved values are bound as component inputs.
    fn bindable(&self) -> bool {
        false
    }

    /// Whether represented segments may contain unencoded slashes.
    fn allows_slashes(&self) -> bool {
        false
    }

    /// Decodes a raw segment into a domain value.
    fn resolve(&self, raw: &str, ctx: &ResolveContext) -> Resolution;

    /// Encodes a domain value into its canonical segment.
    fn represent(&self, value: &Value) -> UrlTypeResult<String>;
}

/// A registered [`UrlType`] together with its compiled, anchored pattern.
#[derive(Clone)]
pub struct TypeDefinition {
    name: String,
    regex: Regex,
    bindable: bool,
    allows_slashes: bool,
    handler: Arc<dyn UrlType>,
}

impl fmt::Debug for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDefinition")
            .field("name", &self.name)
            .field("pattern", &self.pattern())
            .field("bindable", &self.bindable)
            .finish_non_exhaustive()
    }
}

impl TypeDefinition {
    /// Wraps a type, compiling its match pattern.
    ///
    /// # Errors
    ///
    /// Returns [`UrlTypeError::ImproperlyConfigured`] if the name is empty or
    /// the pattern is not a valid regular expression.
    pub fn new(handler: Arc<dyn UrlType>) -> UrlTypeResult<Self> {
        let name = handler.name().to_string();
        if name.is_empty() || name.contains(['{', '}', ':', '/']) {
            return Err(UrlTypeError::ImproperlyConfigured(format!(
                "Invalid url type name: '{name}'"
            )));
        }

        let regex = Regex::new(&format!("^(?:{})$", handler.pattern())).map_err(|e| {
            UrlTypeError::ImproperlyConfigured(format!(
                "Invalid match pattern for url type '{name}': {e}"
            ))
        })?;

        Ok(Self {
            name,
            regex,
            bindable: handler.bindable(),
            allows_slashes: handler.allows_slashes(),
            handler,
        })
    }

    /// Returns the type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unanchored match pattern, as supplied by the type.
    pub fn pattern(&self) -> &str {
        self.handler.pattern()
    }

    /// Returns `true` if resolved values are bound as component inputs.
    pub const fn bindable(&self) -> bool {
        self.bindable
    }

    /// Returns `true` if segments of this type may contain slashes.
    pub const fn allows_slashes(&self) -> bool {
        self.allows_slashes
    }

    /// Returns `true` if the whole raw segment satisfies the match pattern.
    pub fn matches(&self, raw: &str) -> bool {
        self.regex.is_match(raw)
    }

    /// Calls the type's resolve function.
    pub fn resolve(&self, raw: &str, ctx: &ResolveContext) -> Resolution {
        self.handler.resolve(raw, ctx)
    }

    /// Calls the type's represent function.
    pub fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        self.handler.represent(value)
    }
}
