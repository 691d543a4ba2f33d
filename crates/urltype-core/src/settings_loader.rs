//! Router configuration from files and the environment.
//!
//! [`RouterSettings`] can be read from TOML or JSON; partial documents keep
//! the defaults for every field they omit. `URLTYPE_*` variables win over both.
//!
//! Precedence, lowest first: defaults, file, environment.
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `URLTYPE_DEBUG` | `debug` |
//! | `URLTYPE_LOG_LEVEL` | `log_level` |
//! | `URLTYPE_USE_HASH` | `use_hash` |
//! | `URLTYPE_HASH_PREFIX` | `hash_prefix` |
//! | `URLTYPE_BASE_URL` | `base_url` |
//! | `URLTYPE_ENCODE_SEGMENTS` | `encode_segments` |
//! | `URLTYPE_NULL_POLICY` | `null_policy` (`empty` / `reject`) |
//! | `URLTYPE_MISMATCH_POLICY` | `mismatch_policy` (`fatal` / `passthrough`) |
//! | `URLTYPE_BUILTIN_TYPES` | `register_builtin_types` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use urltype_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/router.toml").unwrap();
//! let settings = settings_loader::from_json_file_with_env("config/router.json").unwrap();
//! ```

use std::path::Path;

use crate::error::UrlTypeError;
use crate::settings::RouterSettings;

/// Parses router settings from TOML text.
///
/// # Errors
///
/// Returns [`UrlTypeError::ConfigurationError`] for invalid TOML or values
/// of the wrong shape (e.g. an unknown `null_policy`).
pub fn from_toml_str(toml_str: &str) -> Result<RouterSettings, UrlTypeError> {
    // Merge through serde_json so partial files keep the defaults.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| UrlTypeError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Reads router settings from a TOML file.
///
/// # Errors
///
/// Returns [`UrlTypeError::IoError`] if the file cannot be read and
/// [`UrlTypeError::ConfigurationError`] if its contents are invalid.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<RouterSettings, UrlTypeError> {
    let content = read_config(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// [`from_toml_file`], then [`apply_env_overrides`].
///
/// # Errors
///
/// Returns [`UrlTypeError::IoError`] if the file cannot be read and
/// [`UrlTypeError::ConfigurationError`] if its contents are invalid.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<RouterSettings, UrlTypeError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Parses router settings from JSON text.
///
/// # Errors
///
/// Returns [`UrlTypeError::ConfigurationError`] for invalid JSON or values
/// of the wrong shape.
pub fn from_json_str(json_str: &str) -> Result<RouterSettings, UrlTypeError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| UrlTypeError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Reads router settings from a JSON file.
///
/// # Errors
///
/// Returns [`UrlTypeError::IoError`] if the file cannot be read and
/// [`UrlTypeError::ConfigurationError`] if its contents are invalid.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<RouterSettings, UrlTypeError> {
    let content = read_config(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// [`from_json_file`], then [`apply_env_overrides`].
///
/// # Errors
///
/// Returns [`UrlTypeError::IoError`] if the file cannot be read and
/// [`UrlTypeError::ConfigurationError`] if its contents are invalid.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<RouterSettings, UrlTypeError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Default settings with `URLTYPE_*` overrides applied.
pub fn from_env() -> RouterSettings {
    let mut settings = RouterSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `URLTYPE_*` environment variable overrides to a settings struct.
///
/// Boolean variables accept "true"/"1"/"yes"; anything else means false.
/// Policy variables that fail to parse are ignored with a warning.
pub fn apply_env_overrides(settings: &mut RouterSettings) {
    if let Ok(val) = std::env::var("URLTYPE_DEBUG") {
        settings.debug = parse_bool(&val);
    }

    if let Ok(val) = std::env::var("URLTYPE_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("URLTYPE_USE_HASH") {
        settings.use_hash = parse_bool(&val);
    }

    if let Ok(val) = std::env::var("URLTYPE_HASH_PREFIX") {
        settings.hash_prefix = val;
    }

    if let Ok(val) = std::env::var("URLTYPE_BASE_URL") {
        settings.base_url = val;
    }

    if let Ok(val) = std::env::var("URLTYPE_ENCODE_SEGMENTS") {
        settings.encode_segments = parse_bool(&val);
    }

    if let Ok(val) = std::env::var("URLTYPE_NULL_POLICY") {
        match val.parse() {
            Ok(policy) => settings.null_policy = policy,
            Err(e) => tracing::warn!(error = %e, "ignoring URLTYPE_NULL_POLICY"),
        }
    }

    if let Ok(val) = std::env::var("URLTYPE_MISMATCH_POLICY") {
        match val.parse() {
            Ok(policy) => settings.mismatch_policy = policy,
            Err(e) => tracing::warn!(error = %e, "ignoring URLTYPE_MISMATCH_POLICY"),
        }
    }

    if let Ok(val) = std::env::var("URLTYPE_BUILTIN_TYPES") {
        settings.register_builtin_types = parse_bool(&val);
    }
}

fn parse_bool(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_config(path: &Path, format: &str) -> Result<String, UrlTypeError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        tracing::warn!(path = %path.display(), format, error = %e, "cannot read settings file");
        e
    })?;
    Ok(content)
}

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<RouterSettings, UrlTypeError> {
    let default_json = serde_json::to_value(RouterSettings::default()).map_err(|e| {
        UrlTypeError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        UrlTypeError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })
}

fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Objects merge key by key; any other value replaces the base.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
