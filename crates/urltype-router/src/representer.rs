//! Representation of domain values as URL segments.
//!
//! [`Representer`] is the inverse of the resolver. It never performs I/O and
//! never suspends, so URL generation cannot block on a lookup.
//!
//! Scalars (strings, numbers, booleans) are taken to be raw segments already
//! and are written as-is; objects and arrays go through the type's
//! `represent`. A type whose `represent` reads `pk` from an object therefore
//! produces `"1"` for both `1` and `{"pk": 1}`.

use std::sync::Arc;

use serde_json::Value;

use urltype_core::{NullPolicy, RouterSettings, UrlTypeError, UrlTypeResult};

use crate::registry::TypeRegistry;

/// Encodes domain values through a [`TypeRegistry`].
#[derive(Debug, Clone)]
pub struct Representer {
    registry: Arc<TypeRegistry>,
    null_policy: NullPolicy,
}

impl Representer {
    /// Creates a representer over the given registry.
    pub fn new(registry: Arc<TypeRegistry>, settings: &RouterSettings) -> Self {
        Self {
            registry,
            null_policy: settings.null_policy,
        }
    }

    /// Returns the null policy in effect.
    pub const fn null_policy(&self) -> NullPolicy {
        self.null_policy
    }

    /// Represents `value` as a segment of type `type_name`.
    ///
    /// # Errors
    ///
    /// - [`UrlTypeError::UnknownType`] if the type is not registered
    /// - [`UrlTypeError::MissingValue`] for `None`/`null` under [`NullPolicy::Reject`]
    /// - [`UrlTypeError::Representation`] if the type cannot represent the
    ///   value, or the result does not satisfy the type's match pattern
    pub fn represent(&self, type_name: &str, value: Option<&Value>) -> UrlTypeResult<String> {
        let definition = self.registry.lookup(type_name)?;

        let segment = match value {
            None | Some(Value::Null) => {
                return match self.null_policy {
                    NullPolicy::Empty => Ok(String::new()),
                    NullPolicy::Reject => Err(UrlTypeError::MissingValue(type_name.to_string())),
                };
            }
            Some(Value::String(s)) => s.clone(),
            Some(scalar @ (Value::Number(_) | Value::Bool(_))) => scalar.to_string(),
            Some(value) => definition.represent(value)?,
        };

        if !definition.matches(&segment) {
            return Err(UrlTypeError::Representation {
                type_name: type_name.to_string(),
                message: format!("'{segment}' does not match pattern '{}'", definition.pattern()),
            });
        }
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::definition::{ResolveContext, Resolution, Services, UrlType};
    use crate::transition::TransitionId;

    #[derive(Debug)]
    struct Record;

    impl UrlType for Record {
        fn name(&self) -> &str {
            "Record"
        }

        fn pattern(&self) -> &str {
            r"\d+"
        }

        fn resolve(&self, raw: &str, _ctx: &ResolveContext) -> Resolution {
            Resolution::ready(json!({ "pk": raw.parse::<u64>().unwrap_or_default() }))
        }

        fn represent(&self, value: &Value) -> UrlTypeResult<String> {
            match value.get("pk") {
                Some(Value::Number(pk)) => Ok(pk.to_string()),
                _ => Err(UrlTypeError::Representation {
                    type_name: "Record".to_string(),
                    message: "object has no numeric pk".to_string(),
                }),
            }
        }
    }

    fn representer(null_policy: NullPolicy) -> Representer {
        let mut registry = TypeRegistry::with_builtins();
        registry.register(Arc::new(Record)).unwrap();
        let settings = RouterSettings {
            null_policy,
            ..RouterSettings::default()
        };
        Representer::new(Arc::new(registry), &settings)
    }

    #[test]
    fn test_primitive_and_object_represent_alike() {
        let r = representer(NullPolicy::Empty);
        assert_eq!(r.represent("Record", Some(&json!(1))).unwrap(), "1");
        assert_eq!(r.represent("Record", Some(&json!({ "pk": 1 }))).unwrap(), "1");
        assert_eq!(r.represent("Record", Some(&json!("1"))).unwrap(), "1");
    }

    #[test]
    fn test_represent_is_idempotent() {
        let r = representer(NullPolicy::Empty);
        let value = json!({ "pk": 7, "attr1": "x" });
        let first = r.represent("Record", Some(&value)).unwrap();
        let second = r.represent("Record", Some(&value)).unwrap();
        assert_eq!(first, second);
        assert_eq!(value, json!({ "pk": 7, "attr1": "x" }));
    }

    #[test]
    fn test_null_policy_empty() {
        let r = representer(NullPolicy::Empty);
        assert_eq!(r.represent("Record", None).unwrap(), "");
        assert_eq!(r.represent("Record", Some(&Value::Null)).unwrap(), "");
    }

    #[test]
    fn test_null_policy_reject() {
        let r = representer(NullPolicy::Reject);
        let err = r.represent("Record", None).unwrap_err();
        assert!(matches!(err, UrlTypeError::MissingValue(ref t) if t == "Record"));
    }

    #[test]
    fn test_unknown_type() {
        let r = representer(NullPolicy::Empty);
        assert!(matches!(
            r.represent("Nope", Some(&json!(1))),
            Err(UrlTypeError::UnknownType(_))
        ));
    }

    #[test]
    fn test_represent_failure_propagates() {
        let r = representer(NullPolicy::Empty);
        let err = r.represent("Record", Some(&json!({ "id": 1 }))).unwrap_err();
        assert!(matches!(err, UrlTypeError::Representation { .. }));
    }

    #[test]
    fn test_output_must_match_pattern() {
        let r = representer(NullPolicy::Empty);
        assert!(r.represent("Record", Some(&json!("abc"))).is_err());
        assert!(r.represent("int", Some(&json!(true))).is_err());
        assert_eq!(r.represent("bool", Some(&json!(false))).unwrap(), "false");
    }

    #[test]
    fn test_resolve_of_representation_round_trips() {
        let r = representer(NullPolicy::Empty);
        let canonical = r.represent("Record", Some(&json!({ "pk": 5 }))).unwrap();
        let ctx = ResolveContext {
            param: "p".to_string(),
            transition: TransitionId::new(1),
            services: Services::new(),
        };
        let resolved = tokio_test::block_on(Record.resolve(&canonical, &ctx).into_future()).unwrap();
        assert_eq!(r.represent("Record", Some(&resolved)).unwrap(), canonical);
    }
}
