//! Installation of URL types into a host router.
//!
//! [`ConfigurationBinder`] registers one framework-native [`ParamType`] per
//! registered URL type with a [`ParamTypeHost`]. Each adapter only forwards:
//! decoding goes to the [`ParameterResolver`], encoding to the
//! [`Representer`], and validity checks to the type's match pattern.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use urltype_core::{RouterSettings, UrlTypeError, UrlTypeResult};

use crate::definition::{Services, TypeDefinition};
use crate::pattern::SegmentSyntax;
use crate::registry::TypeRegistry;
use crate::representer::Representer;
use crate::resolver::{ParamDecoder, ParameterResolver};
use crate::transition::TransitionId;

/// The parameter-type adapter handed to the host router.
#[derive(Debug, Clone)]
pub struct ParamType {
    definition: TypeDefinition,
    resolver: Arc<ParameterResolver>,
    representer: Arc<Representer>,
}

impl ParamType {
    /// Returns the type name.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Returns the match pattern.
    pub fn pattern(&self) -> &str {
        self.definition.pattern()
    }

    /// Returns `true` if resolved values are bound to components.
    pub const fn bindable(&self) -> bool {
        self.definition.bindable()
    }

    /// Returns the syntax used when compiling URL templates.
    pub fn syntax(&self) -> SegmentSyntax {
        SegmentSyntax {
            pattern: self.definition.pattern().to_string(),
            allows_slashes: self.definition.allows_slashes(),
        }
    }

    /// Returns `true` if `raw` is a valid segment for this type.
    pub fn is(&self, raw: &str) -> bool {
        self.definition.matches(raw)
    }

    /// Decodes a raw segment for `param`.
    pub fn decode(
        &self,
        param: &str,
        raw: &str,
        transition: TransitionId,
    ) -> BoxFuture<'static, UrlTypeResult<Value>> {
        self.resolver
            .resolve(param, self.definition.name(), raw, transition)
    }

    /// Encodes a value into a segment.
    pub fn encode(&self, value: Option<&Value>) -> UrlTypeResult<String> {
        self.representer.represent(self.definition.name(), value)
    }
}

/// The extension point through which a host router accepts parameter types.
pub trait ParamTypeHost {
    /// Registers a parameter type.
    ///
    /// Hosts should reject a name they already know with
    /// [`UrlTypeError::DuplicateType`].
    fn register_param_type(&mut self, param_type: ParamType) -> UrlTypeResult<()>;
}

/// Parameter types keyed by name, as a host would store them.
///
/// Also serves as a [`ParamDecoder`] so the host's transitions can be driven
/// by the [`TransitionAggregator`](crate::aggregator::TransitionAggregator).
#[derive(Debug, Clone, Default)]
pub struct ParamTypeTable {
    types: HashMap<String, ParamType>,
}

impl ParamTypeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parameter type with this name.
    ///
    /// # Errors
    ///
    /// Returns [`UrlTypeError::UnknownType`] if the type was never installed.
    pub fn get(&self, name: &str) -> UrlTypeResult<&ParamType> {
        self.types
            .get(name)
            .ok_or_else(|| UrlTypeError::UnknownType(name.to_string()))
    }

    /// Returns the number of installed types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are installed.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ParamTypeHost for ParamTypeTable {
    fn register_param_type(&mut self, param_type: ParamType) -> UrlTypeResult<()> {
        let name = param_type.name().to_string();
        if self.types.contains_key(&name) {
            return Err(UrlTypeError::DuplicateType(name));
        }
        self.types.insert(name, param_type);
        Ok(())
    }
}

impl ParamDecoder for ParamTypeTable {
    fn decode(
        &self,
        param: &str,
        type_name: &str,
        raw: &str,
        transition: TransitionId,
    ) -> BoxFuture<'static, UrlTypeResult<Value>> {
        match self.get(type_name) {
            Ok(param_type) => param_type.decode(param, raw, transition),
            Err(e) => future::ready(Err(e)).boxed(),
        }
    }
}

/// Wires a [`TypeRegistry`] into a host router.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use urltype_core::RouterSettings;
/// use urltype_router::binder::{ConfigurationBinder, ParamTypeTable};
/// use urltype_router::registry::TypeRegistry;
///
/// let registry = Arc::new(TypeRegistry::with_builtins());
/// let binder = ConfigurationBinder::new(registry, &RouterSettings::default());
/// let mut table = ParamTypeTable::new();
/// let installed = binder.install(&mut table).unwrap();
/// assert_eq!(installed, table.len());
/// assert!(table.get("int").unwrap().is("42"));
/// ```
#[derive(Debug, Clone)]
pub struct ConfigurationBinder {
    registry: Arc<TypeRegistry>,
    resolver: Arc<ParameterResolver>,
    representer: Arc<Representer>,
}

impl ConfigurationBinder {
    /// Creates a binder for the given registry.
    pub fn new(registry: Arc<TypeRegistry>, settings: &RouterSettings) -> Self {
        Self::with_services(registry, settings, Services::new())
    }

    /// Creates a binder whose resolves can reach `services`.
    pub fn with_services(
        registry: Arc<TypeRegistry>,
        settings: &RouterSettings,
        services: Services,
    ) -> Self {
        let resolver =
            ParameterResolver::new(Arc::clone(&registry), settings).with_services(services);
        let representer = Representer::new(Arc::clone(&registry), settings);
        Self {
            registry,
            resolver: Arc::new(resolver),
            representer: Arc::new(representer),
        }
    }

    /// Returns the shared resolver.
    pub const fn resolver(&self) -> &Arc<ParameterResolver> {
        &self.resolver
    }

    /// Returns the shared representer.
    pub const fn representer(&self) -> &Arc<Representer> {
        &self.representer
    }

    /// Registers every type of the registry with `host`, in registration order.
    ///
    /// Returns the number of installed types.
    ///
    /// # Errors
    ///
    /// Propagates the first error reported by the host.
    pub fn install<H: ParamTypeHost + ?Sized>(&self, host: &mut H) -> UrlTypeResult<usize> {
        let mut installed = 0;
        for definition in self.registry.iter() {
            host.register_param_type(ParamType {
                definition: definition.clone(),
                resolver: Arc::clone(&self.resolver),
                representer: Arc::clone(&self.representer),
            })?;
            tracing::debug!(url_type = definition.name(), "installed url type");
            installed += 1;
        }
        tracing::info!(installed, "url types installed");
        Ok(installed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn binder() -> ConfigurationBinder {
        ConfigurationBinder::new(
            Arc::new(TypeRegistry::with_builtins()),
            &RouterSettings::default(),
        )
    }

    #[test]
    fn test_install_registers_every_type() {
        let mut table = ParamTypeTable::new();
        let installed = binder().install(&mut table).unwrap();
        assert_eq!(installed, 6);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_install_twice_reports_duplicate() {
        let b = binder();
        let mut table = ParamTypeTable::new();
        b.install(&mut table).unwrap();
        let err = b.install(&mut table).unwrap_err();
        assert!(matches!(err, UrlTypeError::DuplicateType(_)));
    }

    #[test]
    fn test_adapter_forwards_encode_and_is() {
        let mut table = ParamTypeTable::new();
        binder().install(&mut table).unwrap();
        let int = table.get("int").unwrap();
        assert_eq!(int.name(), "int");
        assert_eq!(int.pattern(), "-?[0-9]+");
        assert!(int.bindable());
        assert!(int.is("-3"));
        assert!(!int.is("x"));
        assert_eq!(int.encode(Some(&json!(12))).unwrap(), "12");
        assert!(!int.syntax().allows_slashes);
    }

    #[tokio::test]
    async fn test_table_decodes_through_resolver() {
        let mut table = ParamTypeTable::new();
        binder().install(&mut table).unwrap();
        let t = TransitionId::new(1);
        assert_eq!(table.decode("n", "int", "5", t).await.unwrap(), json!(5));
        assert!(matches!(
            table.decode("n", "Nope", "5", t).await,
            Err(UrlTypeError::UnknownType(_))
        ));
    }
}
