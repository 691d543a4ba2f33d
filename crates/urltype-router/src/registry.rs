//! The URL type registry.
//!
//! [`TypeRegistry`] maps type names to [`TypeDefinition`]s. It is populated
//! once at startup and then shared read-only (usually behind an `Arc`) by the
//! resolver, the representer and the URL pattern parser.

use std::collections::HashMap;
use std::sync::Arc;

use urltype_core::{UrlTypeError, UrlTypeResult};

use crate::builtins;
use crate::definition::{TypeDefinition, UrlType};

/// A registry of named URL types.
///
/// # Examples
///
/// ```
/// use urltype_router::registry::TypeRegistry;
///
/// let registry = TypeRegistry::with_builtins();
/// assert!(registry.contains("int"));
/// assert!(registry.lookup("Article").is_err());
/// ```
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDefinition>,
    // Registration order, for deterministic installation.
    order: Vec<String>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for handler in builtins::all() {
            // Built-in names are distinct and their patterns are valid.
            if let Err(e) = registry.register(handler) {
                tracing::error!(error = %e, "failed to register built-in url type");
            }
        }
        registry
    }

    /// Registers a type.
    ///
    /// # Errors
    ///
    /// Returns [`UrlTypeError::DuplicateType`] if a type with the same name is
    /// already registered, or [`UrlTypeError::ImproperlyConfigured`] if the
    /// type's name or pattern is invalid.
    pub fn register(&mut self, handler: Arc<dyn UrlType>) -> UrlTypeResult<()> {
        let definition = TypeDefinition::new(handler)?;
        let name = definition.name().to_string();
        if self.types.contains_key(&name) {
            return Err(UrlTypeError::DuplicateType(name));
        }

        tracing::debug!(
            url_type = %name,
            pattern = definition.pattern(),
            bindable = definition.bindable(),
            "registered url type"
        );
        self.order.push(name.clone());
        self.types.insert(name, definition);
        Ok(())
    }

    /// Registers several types, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// See [`TypeRegistry::register`].
    pub fn register_all<I>(&mut self, handlers: I) -> UrlTypeResult<()>
    where
        I: IntoIterator<Item = Arc<dyn UrlType>>,
    {
        handlers
            .into_iter()
            .try_for_each(|handler| self.register(handler))
    }

    /// Looks up a type by name.
    ///
    /// # Errors
    ///
    /// Returns [`UrlTypeError::UnknownType`] if no such type is registered.
    pub fn lookup(&self, name: &str) -> UrlTypeResult<&TypeDefinition> {
        self.types
            .get(name)
            .ok_or_else(|| UrlTypeError::UnknownType(name.to_string()))
    }

    /// Returns `true` if a type with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns the registered definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }

    /// Returns the registered type names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
