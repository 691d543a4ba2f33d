//! A minimal state router hosting URL types.
//!
//! [`StateRouter`] is the reference [`ParamTypeHost`]: states declare URL
//! templates with typed placeholders, and every transition resolves those
//! parameters through the [`TransitionAggregator`] before anything is
//! committed. It has no history handling and no nested states.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;

use urltype_core::logging::transition_span;
use urltype_core::{RouterSettings, UrlTypeError, UrlTypeResult};

use crate::aggregator::{TransitionAggregator, TypedParam};
use crate::binder::{ConfigurationBinder, ParamType, ParamTypeHost, ParamTypeTable};
use crate::definition::{Services, UrlType};
use crate::pattern::UrlPattern;
use crate::registry::TypeRegistry;
use crate::resolver::ParamDecoder;
use crate::transition::{TransitionId, TransitionTracker};

/// A state as declared by the application.
///
/// Declarations deserialize from configuration, e.g.
/// `{"name": "user", "url": "/users/{id:int}", "component": "UserPage"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDeclaration {
    /// The unique state name.
    pub name: String,
    /// The URL template, e.g. `/users/{user:User}`.
    pub url: String,
    /// The component rendered for this state.
    pub component: String,
}

impl StateDeclaration {
    /// Creates a state declaration.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            component: component.into(),
        }
    }
}

#[derive(Debug)]
struct RegisteredState {
    declaration: StateDeclaration,
    pattern: UrlPattern,
}

/// Inputs bound to the active component.
///
/// Values are the same allocations held by the global parameter map.
#[derive(Debug, Clone, Default)]
pub struct ComponentBindings {
    component: String,
    inputs: HashMap<String, Arc<Value>>,
}

impl ComponentBindings {
    /// Returns the component these inputs belong to.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Returns the input bound under `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<Value>> {
        self.inputs.get(name)
    }

    /// Iterates over the bound inputs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Value>)> {
        self.inputs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of bound inputs.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// The router's globally visible state.
#[derive(Debug, Clone, Default)]
pub struct RouterGlobals {
    /// The active state, if any transition has completed.
    pub current_state: Option<String>,
    /// The resolved parameters of the active state.
    pub params: HashMap<String, Arc<Value>>,
    /// The transition that produced the active state.
    pub transition_id: Option<TransitionId>,
}

/// The result of a completed transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// The transition id.
    pub transition: TransitionId,
    /// The state entered.
    pub state: String,
    /// Every resolved parameter.
    pub params: HashMap<String, Arc<Value>>,
    /// The inputs bound to the state's component.
    pub bindings: ComponentBindings,
}

#[derive(Debug, Default)]
struct Active {
    globals: RouterGlobals,
    bindings: Option<ComponentBindings>,
}

/// A router that resolves typed URL parameters on every transition.
///
/// # Examples
///
/// ```
/// use urltype_core::RouterSettings;
/// use urltype_router::definition::Services;
/// use urltype_router::router::{StateDeclaration, StateRouter};
///
/// let mut router = StateRouter::configure(RouterSettings::default(), Vec::new(), Services::new()).unwrap();
/// router.register_state(StateDeclaration::new("user", "/users/{id:int}", "UserPage")).unwrap();
/// let href = router.href("user", &serde_json::json!({"id": 7})).unwrap();
/// assert_eq!(href, "#/users/7");
/// ```
pub struct StateRouter {
    settings: RouterSettings,
    param_types: Arc<ParamTypeTable>,
    states: Vec<RegisteredState>,
    tracker: Arc<TransitionTracker>,
    active: RwLock<Active>,
}

impl fmt::Debug for StateRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRouter")
            .field("param_types", &self.param_types.len())
            .field("states", &self.states.len())
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl StateRouter {
    /// Creates a router with no parameter types installed.
    pub fn new(settings: RouterSettings) -> Self {
        Self {
            settings,
            param_types: Arc::new(ParamTypeTable::new()),
            states: Vec::new(),
            tracker: Arc::new(TransitionTracker::new()),
            active: RwLock::new(Active::default()),
        }
    }

    /// Creates a router with `types` installed, plus the built-in types when
    /// `register_builtin_types` is set.
    ///
    /// # Errors
    ///
    /// Returns [`UrlTypeError::DuplicateType`] or
    /// [`UrlTypeError::ImproperlyConfigured`] if a type cannot be registered.
    pub fn configure(
        settings: RouterSettings,
        types: Vec<Arc<dyn UrlType>>,
        services: Services,
    ) -> UrlTypeResult<Self> {
        let mut registry = if settings.register_builtin_types {
            TypeRegistry::with_builtins()
        } else {
            TypeRegistry::new()
        };
        registry.register_all(types)?;

        let binder = ConfigurationBinder::with_services(Arc::new(registry), &settings, services);
        let mut router = Self::new(settings);
        binder.install(&mut router)?;
        Ok(router)
    }

    /// Returns the router settings.
    pub const fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Returns the installed parameter types.
    pub fn param_types(&self) -> &ParamTypeTable {
        &self.param_types
    }

    /// Registers a state.
    ///
    /// # Errors
    ///
    /// - [`UrlTypeError::DuplicateState`] if the name is taken
    /// - [`UrlTypeError::UnknownType`] if the template names an uninstalled type
    /// - [`UrlTypeError::InvalidPattern`] if the template is malformed
    pub fn register_state(&mut self, declaration: StateDeclaration) -> UrlTypeResult<()> {
        if self.find_state(&declaration.name).is_ok() {
            return Err(UrlTypeError::DuplicateState(declaration.name));
        }
        let table = &self.param_types;
        let pattern = UrlPattern::parse(&declaration.url, |type_name| {
            table.get(type_name).map(ParamType::syntax)
        })?;
        tracing::debug!(state = %declaration.name, url = %declaration.url, "registered state");
        self.states.push(RegisteredState {
            declaration,
            pattern,
        });
        Ok(())
    }

    /// Transitions to `state` with the given parameter values.
    ///
    /// `params` must be an object keyed by parameter name. Each value is
    /// represented to a raw segment and then resolved like a URL segment, so
    /// domain objects and primitives are both accepted. Absent parameters are
    /// represented as null.
    ///
    /// # Errors
    ///
    /// - [`UrlTypeError::UnknownState`] if the state is not registered
    /// - [`UrlTypeError::InvalidParams`] if `params` is not an object or names
    ///   a parameter the state does not declare
    /// - representation errors from the parameter types
    /// - [`UrlTypeError::TransitionResolution`] or
    ///   [`UrlTypeError::TransitionSuperseded`] from the transition itself
    pub async fn go(&self, state: &str, params: &Value) -> UrlTypeResult<TransitionOutcome> {
        let registered = self.find_state(state)?;
        let segments = self.represent_params(registered, params)?;
        let typed = registered
            .pattern
            .params()
            .iter()
            .map(|p| {
                let raw = segments.get(&p.name).cloned().unwrap_or_default();
                TypedParam::new(p.name.clone(), p.type_name.clone(), raw)
            })
            .collect();
        self.run_transition(registered, typed).await
    }

    /// Transitions to the first state whose template matches `url`.
    ///
    /// The hash prefix and base URL are stripped first, as is any query string.
    ///
    /// # Errors
    ///
    /// Returns [`UrlTypeError::NoMatch`] if no state matches, and otherwise
    /// the errors of [`StateRouter::go`].
    pub async fn navigate(&self, url: &str) -> UrlTypeResult<TransitionOutcome> {
        let prefix = self.settings.url_prefix();
        let path = url.strip_prefix(prefix.as_str()).unwrap_or(url);
        let path = path.split_once('?').map_or(path, |(path, _)| path);

        for registered in &self.states {
            if let Some(typed) = registered.pattern.match_path(path) {
                tracing::debug!(url, state = %registered.declaration.name, "url matched");
                return self.run_transition(registered, typed).await;
            }
        }
        Err(UrlTypeError::NoMatch(url.to_string()))
    }

    /// Builds the URL of `state` for the given parameter values.
    ///
    /// # Errors
    ///
    /// Returns [`UrlTypeError::UnknownState`], [`UrlTypeError::InvalidParams`],
    /// or any representation error.
    pub fn href(&self, state: &str, params: &Value) -> UrlTypeResult<String> {
        let registered = self.find_state(state)?;
        let segments = self.represent_params(registered, params)?;
        let path = registered
            .pattern
            .format(&segments, self.settings.encode_segments)?;
        Ok(format!("{}{path}", self.settings.url_prefix()))
    }

    /// Returns a snapshot of the global state.
    pub fn globals(&self) -> RouterGlobals {
        self.active
            .read()
            .expect("router state lock poisoned")
            .globals
            .clone()
    }

    /// Returns the inputs bound to `component`, if it is the active component.
    pub fn bindings(&self, component: &str) -> Option<ComponentBindings> {
        self.active
            .read()
            .expect("router state lock poisoned")
            .bindings
            .as_ref()
            .filter(|b| b.component == component)
            .cloned()
    }

    fn find_state(&self, name: &str) -> UrlTypeResult<&RegisteredState> {
        self.states
            .iter()
            .find(|s| s.declaration.name == name)
            .ok_or_else(|| UrlTypeError::UnknownState(name.to_string()))
    }

    fn represent_params(
        &self,
        registered: &RegisteredState,
        params: &Value,
    ) -> UrlTypeResult<HashMap<String, String>> {
        let empty = serde_json::Map::new();
        let values = match params {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(UrlTypeError::InvalidParams(format!(
                    "expected an object, got {other}"
                )))
            }
        };
        let declared = registered.pattern.params();
        if let Some(unknown) = values.keys().find(|k| !declared.iter().any(|p| &p.name == *k)) {
            return Err(UrlTypeError::InvalidParams(format!(
                "state '{}' has no parameter '{unknown}'",
                registered.declaration.name
            )));
        }

        declared
            .iter()
            .map(|p| {
                let param_type = self.param_types.get(&p.type_name)?;
                let segment = param_type.encode(values.get(&p.name))?;
                Ok((p.name.clone(), segment))
            })
            .collect()
    }

    async fn run_transition(
        &self,
        registered: &RegisteredState,
        params: Vec<TypedParam>,
    ) -> UrlTypeResult<TransitionOutcome> {
        let token = self.tracker.begin();
        let name = registered.declaration.name.as_str();
        let span = transition_span(token.get(), name);

        let decoder: Arc<dyn ParamDecoder> = self.param_types.clone();
        let aggregator = TransitionAggregator::new(decoder, Arc::clone(&self.tracker));
        let resolved = aggregator
            .resolve_all(token, params)
            .instrument(span.clone())
            .await?;
        let params = resolved.into_inner();

        let inputs = registered
            .pattern
            .params()
            .iter()
            .filter(|p| {
                self.param_types
                    .get(&p.type_name)
                    .is_ok_and(ParamType::bindable)
            })
            .filter_map(|p| params.get(&p.name).map(|v| (p.name.clone(), Arc::clone(v))))
            .collect();
        let bindings = ComponentBindings {
            component: registered.declaration.component.clone(),
            inputs,
        };

        let mut active = self.active.write().expect("router state lock poisoned");
        if !self.tracker.is_current(token) {
            span.in_scope(|| tracing::debug!("transition superseded before commit"));
            return Err(UrlTypeError::TransitionSuperseded(token.get()));
        }
        active.globals = RouterGlobals {
            current_state: Some(name.to_string()),
            params: params.clone(),
            transition_id: Some(token),
        };
        active.bindings = Some(bindings.clone());
        drop(active);

        span.in_scope(|| tracing::info!(params = params.len(), "transition committed"));
        Ok(TransitionOutcome {
            transition: token,
            state: name.to_string(),
            params,
            bindings,
        })
    }
}

impl ParamTypeHost for StateRouter {
    fn register_param_type(&mut self, param_type: ParamType) -> UrlTypeResult<()> {
        Arc::make_mut(&mut self.param_types).register_param_type(param_type)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn router() -> StateRouter {
        let mut router =
            StateRouter::configure(RouterSettings::default(), Vec::new(), Services::new()).unwrap();
        router
            .register_state(StateDeclaration::new("user", "/users/{id:int}", "UserPage"))
            .unwrap();
        router
            .register_state(StateDeclaration::new("page", "/pages/{slug:slug}", "Page"))
            .unwrap();
        router
    }

    #[test]
    fn test_duplicate_state() {
        let mut r = router();
        let err = r
            .register_state(StateDeclaration::new("user", "/other", "X"))
            .unwrap_err();
        assert!(matches!(err, UrlTypeError::DuplicateState(_)));
    }

    #[test]
    fn test_unknown_type_in_template() {
        let mut r = router();
        let err = r
            .register_state(StateDeclaration::new("x", "/x/{id:Missing}", "X"))
            .unwrap_err();
        assert!(matches!(err, UrlTypeError::UnknownType(ref n) if n == "Missing"));
    }

    #[test]
    fn test_href_uses_prefix() {
        let r = router();
        assert_eq!(r.href("user", &json!({"id": 3})).unwrap(), "#/users/3");
        assert!(matches!(
            r.href("nope", &json!({})),
            Err(UrlTypeError::UnknownState(_))
        ));
        assert!(matches!(
            r.href("user", &json!({"other": 1})),
            Err(UrlTypeError::InvalidParams(_))
        ));
        assert!(matches!(
            r.href("user", &json!([1])),
            Err(UrlTypeError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_href_without_hash() {
        let settings = RouterSettings {
            use_hash: false,
            base_url: "/app/".to_string(),
            ..RouterSettings::default()
        };
        let mut r = StateRouter::configure(settings, Vec::new(), Services::new()).unwrap();
        r.register_state(StateDeclaration::new("page", "/pages/{slug:slug}", "Page"))
            .unwrap();
        assert_eq!(
            r.href("page", &json!({"slug": "intro"})).unwrap(),
            "/app/pages/intro"
        );
    }

    #[tokio::test]
    async fn test_go_commits_globals_and_bindings() {
        let r = router();
        let outcome = r.go("user", &json!({"id": 42})).await.unwrap();
        assert_eq!(outcome.state, "user");
        assert_eq!(*outcome.params["id"], json!(42));

        let globals = r.globals();
        assert_eq!(globals.current_state.as_deref(), Some("user"));
        assert_eq!(globals.transition_id, Some(outcome.transition));

        let bindings = r.bindings("UserPage").unwrap();
        assert!(Arc::ptr_eq(bindings.get("id").unwrap(), &globals.params["id"]));
        assert!(r.bindings("Page").is_none());
    }

    #[tokio::test]
    async fn test_navigate_matches_states_in_order() {
        let r = router();
        let outcome = r.navigate("#/pages/hello-world?tab=1").await.unwrap();
        assert_eq!(outcome.state, "page");
        assert_eq!(*outcome.params["slug"], json!("hello-world"));
        assert!(matches!(
            r.navigate("#/nowhere").await,
            Err(UrlTypeError::NoMatch(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_transition_keeps_globals() {
        let r = router();
        r.go("user", &json!({"id": 1})).await.unwrap();
        let before = r.globals();

        let err = r.navigate("#/users/abc").await.unwrap_err();
        assert!(matches!(err, UrlTypeError::NoMatch(_)));
        let err = r.go("user", &json!({"id": "abc"})).await.unwrap_err();
        assert!(matches!(err, UrlTypeError::Representation { .. }));

        let after = r.globals();
        assert_eq!(after.transition_id, before.transition_id);
        assert_eq!(after.current_state, before.current_state);
    }

    #[tokio::test]
    async fn test_empty_null_segment_is_not_navigable() {
        let r = router();
        let href = r.href("user", &json!({})).unwrap();
        assert_eq!(href, "#/users/");
        assert_eq!(r.href("user", &json!({"id": null})).unwrap(), href);
        assert!(matches!(
            r.navigate(&href).await,
            Err(UrlTypeError::NoMatch(_))
        ));
    }

    #[test]
    fn test_state_declaration_from_json() {
        let declaration: StateDeclaration = serde_json::from_value(json!({
            "name": "user",
            "url": "/users/{id:int}",
            "component": "UserPage",
        }))
        .unwrap();
        assert_eq!(
            declaration,
            StateDeclaration::new("user", "/users/{id:int}", "UserPage")
        );
    }

    #[test]
    fn test_manual_installation() {
        let registry = Arc::new(TypeRegistry::with_builtins());
        let binder = ConfigurationBinder::new(registry, &RouterSettings::default());
        let mut r = StateRouter::new(RouterSettings::default());
        assert!(r.param_types().is_empty());
        assert_eq!(binder.install(&mut r).unwrap(), 6);
        assert!(r.param_types().get("uuid").is_ok());
    }
}
