//! Resolution of single URL parameters.
//!
//! [`ParameterResolver`] turns one raw segment into a domain value: it looks
//! up the declared type, re-validates the segment against the type's match
//! pattern and invokes the type's resolve function. Synchronous and
//! asynchronous types come back as the same [`BoxFuture`].

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt, TryFutureExt};
use serde_json::Value;

use urltype_core::{MismatchPolicy, RouterSettings, UrlTypeError, UrlTypeResult};

use crate::definition::{ResolveContext, Services};
use crate::registry::TypeRegistry;
use crate::transition::TransitionId;

/// Something that can decode a raw segment for a named parameter.
///
/// [`ParameterResolver`] decodes straight from the registry; hosts that wrap
/// types in their own adapters implement this to let the
/// [`TransitionAggregator`](crate::aggregator::TransitionAggregator) drive them.
pub trait ParamDecoder: Send + Sync {
    /// Starts decoding `raw` as `type_name` for parameter `param`.
    fn decode(
        &self,
        param: &str,
        type_name: &str,
        raw: &str,
        transition: TransitionId,
    ) -> BoxFuture<'static, UrlTypeResult<Value>>;
}

/// Resolves raw segments through a [`TypeRegistry`].
#[derive(Debug, Clone)]
pub struct ParameterResolver {
    registry: Arc<TypeRegistry>,
    mismatch_policy: MismatchPolicy,
    services: Services,
}

impl ParameterResolver {
    /// Creates a resolver over the given registry.
    pub fn new(registry: Arc<TypeRegistry>, settings: &RouterSettings) -> Self {
        Self {
            registry,
            mismatch_policy: settings.mismatch_policy,
            services: Services::new(),
        }
    }

    /// Makes `services` available to every resolve call.
    #[must_use]
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Returns the registry this resolver reads from.
    pub const fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Resolves `raw` as `type_name` for parameter `param`.
    ///
    /// The type's resolve function is invoked before this returns, so calls
    /// start in the order they are made; only completion may be deferred.
    /// Failures are reported through the returned future:
    ///
    /// - [`UrlTypeError::UnknownType`] if the type is not registered
    /// - [`UrlTypeError::SegmentMismatch`] if `raw` fails the match pattern
    ///   under [`MismatchPolicy::Fatal`]
    /// - [`UrlTypeError::Resolution`] if the type's resolve function fails
    pub fn resolve(
        &self,
        param: &str,
        type_name: &str,
        raw: &str,
        transition: TransitionId,
    ) -> BoxFuture<'static, UrlTypeResult<Value>> {
        let definition = match self.registry.lookup(type_name) {
            Ok(definition) => definition,
            Err(e) => return future::ready(Err(e)).boxed(),
        };

        if !definition.matches(raw) {
            match self.mismatch_policy {
                MismatchPolicy::Fatal => {
                    tracing::debug!(param, url_type = type_name, segment = raw, "segment mismatch");
                    return future::ready(Err(UrlTypeError::SegmentMismatch {
                        param: param.to_string(),
                        type_name: type_name.to_string(),
                        segment: raw.to_string(),
                    }))
                    .boxed();
                }
                MismatchPolicy::Passthrough => {
                    tracing::debug!(
                        param,
                        url_type = type_name,
                        segment = raw,
                        "segment mismatch, passing raw string through"
                    );
                    return future::ready(Ok(Value::String(raw.to_string()))).boxed();
                }
            }
        }

        let ctx = ResolveContext {
            param: param.to_string(),
            transition,
            services: self.services.clone(),
        };
        let resolution = definition.resolve(raw, &ctx);
        tracing::trace!(
            param,
            url_type = type_name,
            ready = resolution.is_ready(),
            "resolve started"
        );

        let param = param.to_string();
        let type_name = type_name.to_string();
        resolution
            .into_future()
            .map_err(move |source| UrlTypeError::Resolution {
                param,
                type_name,
                source,
            })
            .boxed()
    }
}

impl ParamDecoder for ParameterResolver {
    fn decode(
        &self,
        param: &str,
        type_name: &str,
        raw: &str,
        transition: TransitionId,
    ) -> BoxFuture<'static, UrlTypeResult<Value>> {
        self.resolve(param, type_name, raw, transition)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::definition::{Resolution, UrlType};

    #[derive(Debug)]
    struct Lookup;

    /// Shared state fetched by [`Lookup`] from the services map.
    struct Catalog {
        calls: AtomicUsize,
    }

    impl UrlType for Lookup {
        fn name(&self) -> &str {
            "Lookup"
        }

        fn pattern(&self) -> &str {
            r"\d+"
        }

        fn resolve(&self, raw: &str, ctx: &ResolveContext) -> Resolution {
            let catalog = ctx.services.get::<Catalog>();
            let pk: u64 = match raw.parse() {
                Ok(pk) => pk,
                Err(e) => return Resolution::failed(e),
            };
            Resolution::pending(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                if let Some(catalog) = catalog {
                    catalog.calls.fetch_add(1, Ordering::SeqCst);
                }
                if pk == 0 {
                    return Err("no such record".into());
                }
                Ok(json!({ "pk": pk }))
            })
        }

        fn represent(&self, value: &Value) -> UrlTypeResult<String> {
            Ok(value["pk"].to_string())
        }
    }

    fn resolver(policy: MismatchPolicy) -> ParameterResolver {
        let mut registry = TypeRegistry::with_builtins();
        registry.register(Arc::new(Lookup)).unwrap();
        let settings = RouterSettings {
            mismatch_policy: policy,
            ..RouterSettings::default()
        };
        ParameterResolver::new(Arc::new(registry), &settings)
    }

    const T: TransitionId = TransitionId::new(1);

    #[tokio::test]
    async fn test_resolve_sync_builtin() {
        let r = resolver(MismatchPolicy::Fatal);
        assert_eq!(r.resolve("id", "int", "12", T).await.unwrap(), json!(12));
    }

    #[tokio::test]
    async fn test_resolve_async_type() {
        let r = resolver(MismatchPolicy::Fatal);
        assert_eq!(
            r.resolve("item", "Lookup", "3", T).await.unwrap(),
            json!({ "pk": 3 })
        );
    }

    #[tokio::test]
    async fn test_resolve_unknown_type() {
        let r = resolver(MismatchPolicy::Fatal);
        let err = r.resolve("item", "Nope", "3", T).await.unwrap_err();
        assert!(matches!(err, UrlTypeError::UnknownType(ref n) if n == "Nope"));
    }

    #[tokio::test]
    async fn test_resolve_mismatch_is_fatal_by_default() {
        let r = resolver(MismatchPolicy::Fatal);
        let err = r.resolve("item", "Lookup", "abc", T).await.unwrap_err();
        match err {
            UrlTypeError::SegmentMismatch {
                param,
                type_name,
                segment,
            } => {
                assert_eq!(param, "item");
                assert_eq!(type_name, "Lookup");
                assert_eq!(segment, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_mismatch_passthrough() {
        let r = resolver(MismatchPolicy::Passthrough);
        assert_eq!(
            r.resolve("item", "Lookup", "abc", T).await.unwrap(),
            json!("abc")
        );
    }

    #[tokio::test]
    async fn test_resolve_failure_is_tagged() {
        let r = resolver(MismatchPolicy::Fatal);
        let err = r.resolve("item", "Lookup", "0", T).await.unwrap_err();
        assert_eq!(err.param(), Some("item"));
        assert!(matches!(err, UrlTypeError::Resolution { ref type_name, .. } if type_name == "Lookup"));
        assert!(err.to_string().contains("no such record"));
    }

    #[tokio::test]
    async fn test_services_reach_resolve() {
        let catalog = Catalog {
            calls: AtomicUsize::new(0),
        };
        let mut services = Services::new();
        services.insert(catalog);
        let r = resolver(MismatchPolicy::Fatal).with_services(services.clone());

        r.resolve("a", "Lookup", "1", T).await.unwrap();
        r.resolve("b", "Lookup", "2", T).await.unwrap();
        assert_eq!(
            services.get::<Catalog>().unwrap().calls.load(Ordering::SeqCst),
            2
        );
    }

    #[tokio::test]
    async fn test_decoder_forwards_to_resolve() {
        let r = resolver(MismatchPolicy::Fatal);
        let decoder: &dyn ParamDecoder = &r;
        assert_eq!(
            decoder.decode("flag", "bool", "1", T).await.unwrap(),
            json!(true)
        );
    }
}
