//! Built-in URL types.
//!
//! These cover the plain parameter kinds every router offers, so templates
//! can mix custom types with ordinary segments.
//!
//! | Name     | Pattern                              | Value            |
//! |----------|--------------------------------------|------------------|
//! | `int`    | `-?[0-9]+`                           | number           |
//! | `string` | `[^/]*`                              | string           |
//! | `slug`   | `[-a-zA-Z0-9_]+`                     | string           |
//! | `uuid`   | `[0-9a-f]{8}-...-[0-9a-f]{12}`       | string (hyphenated, lowercase) |
//! | `path`   | `.*`                                 | string, slashes kept |
//! | `bool`   | `true\|false\|1\|0`                  | boolean          |
//!
//! Placeholders without a type (`{id}` or `:id`) use [`DEFAULT_TYPE`].

use std::sync::Arc;

use serde_json::Value;

use urltype_core::{UrlTypeError, UrlTypeResult};

use crate::definition::{Resolution, ResolveContext, UrlType};

/// The type used for placeholders that do not name one.
pub const DEFAULT_TYPE: &str = "string";

fn unexpected(type_name: &str, value: &Value) -> UrlTypeError {
    UrlTypeError::Representation {
        type_name: type_name.to_string(),
        message: format!("unexpected value {value}"),
    }
}

/// Integer segments.
#[derive(Debug, Clone, Copy)]
pub struct IntType;

impl UrlType for IntType {
    fn name(&self) -> &str {
        "int"
    }

    fn pattern(&self) -> &str {
        "-?[0-9]+"
    }

    fn bindable(&self) -> bool {
        true
    }

    fn resolve(&self, raw: &str, _ctx: &ResolveContext) -> Resolution {
        match raw.parse::<i64>() {
            Ok(v) => Resolution::ready(Value::from(v)),
            Err(e) => Resolution::failed(format!("Invalid integer value '{raw}': {e}")),
        }
    }

    fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        value
            .as_i64()
            .map(|v| v.to_string())
            .ok_or_else(|| unexpected(self.name(), value))
    }
}

/// Any segment without slashes, including the empty one.
#[derive(Debug, Clone, Copy)]
pub struct StringType;

impl UrlType for StringType {
    fn name(&self) -> &str {
        DEFAULT_TYPE
    }

    fn pattern(&self) -> &str {
        "[^/]*"
    }

    fn bindable(&self) -> bool {
        true
    }

    fn resolve(&self, raw: &str, _ctx: &ResolveContext) -> Resolution {
        Resolution::ready(Value::String(raw.to_string()))
    }

    fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| unexpected(self.name(), value))
    }
}

/// ASCII letters, digits, hyphens and underscores.
#[derive(Debug, Clone, Copy)]
pub struct SlugType;

impl UrlType for SlugType {
    fn name(&self) -> &str {
        "slug"
    }

    fn pattern(&self) -> &str {
        "[-a-zA-Z0-9_]+"
    }

    fn bindable(&self) -> bool {
        true
    }

    fn resolve(&self, raw: &str, _ctx: &ResolveContext) -> Resolution {
        Resolution::ready(Value::String(raw.to_string()))
    }

    fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| unexpected(self.name(), value))
    }
}

/// Hyphenated, lowercase UUIDs.
#[derive(Debug, Clone, Copy)]
pub struct UuidType;

impl UrlType for UuidType {
    fn name(&self) -> &str {
        "uuid"
    }

    fn pattern(&self) -> &str {
        "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"
    }

    fn bindable(&self) -> bool {
        true
    }

    fn resolve(&self, raw: &str, _ctx: &ResolveContext) -> Resolution {
        match raw.parse::<uuid::Uuid>() {
            Ok(v) => Resolution::ready(Value::String(v.hyphenated().to_string())),
            Err(e) => Resolution::failed(format!("Invalid UUID '{raw}': {e}")),
        }
    }

    fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        value
            .as_str()
            .and_then(|s| s.parse::<uuid::Uuid>().ok())
            .map(|v| v.hyphenated().to_string())
            .ok_or_else(|| unexpected(self.name(), value))
    }
}

/// The remainder of a path, slashes included.
#[derive(Debug, Clone, Copy)]
pub struct PathType;

impl UrlType for PathType {
    fn name(&self) -> &str {
        "path"
    }

    fn pattern(&self) -> &str {
        ".*"
    }

    fn bindable(&self) -> bool {
        true
    }

    fn allows_slashes(&self) -> bool {
        true
    }

    fn resolve(&self, raw: &str, _ctx: &ResolveContext) -> Resolution {
        Resolution::ready(Value::String(raw.to_string()))
    }

    fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| unexpected(self.name(), value))
    }
}

/// Booleans, written as `true`/`false` and also accepted as `1`/`0`.
#[derive(Debug, Clone, Copy)]
pub struct BoolType;

impl UrlType for BoolType {
    fn name(&self) -> &str {
        "bool"
    }

    fn pattern(&self) -> &str {
        "true|false|1|0"
    }

    fn bindable(&self) -> bool {
        true
    }

    fn resolve(&self, raw: &str, _ctx: &ResolveContext) -> Resolution {
        match raw {
            "true" | "1" => Resolution::ready(Value::Bool(true)),
            "false" | "0" => Resolution::ready(Value::Bool(false)),
            _ => Resolution::failed(format!("Invalid boolean value '{raw}'")),
        }
    }

    fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        value
            .as_bool()
            .map(|v| v.to_string())
            .ok_or_else(|| unexpected(self.name(), value))
    }
}

/// Returns every built-in type.
pub fn all() -> Vec<Arc<dyn UrlType>> {
    vec![
        Arc::new(IntType),
        Arc::new(StringType),
        Arc::new(SlugType),
        Arc::new(UuidType),
        Arc::new(PathType),
        Arc::new(BoolType),
    ]
}
