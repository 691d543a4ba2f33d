//! Router settings.
//!
//! [`RouterSettings`] holds the configuration shared by the resolver, the
//! representer and the reference state router. Settings are built once at
//! startup and passed explicitly to each component; there is no global
//! settings instance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a null or absent value is represented in a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullPolicy {
    /// Represent as an empty segment.
    ///
    /// The generated URL is not navigable unless the type's pattern accepts
    /// an empty string: `/users/{id:int}` with a null `id` yields `/users/`,
    /// which no longer matches the state. Use [`NullPolicy::Reject`] when
    /// every generated URL must round-trip.
    #[default]
    Empty,
    /// Fail with [`UrlTypeError::MissingValue`](crate::UrlTypeError::MissingValue).
    Reject,
}

impl FromStr for NullPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "empty" => Ok(Self::Empty),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown null policy: {other}")),
        }
    }
}

impl fmt::Display for NullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// What the resolver does when a raw segment fails its type's match pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Fail the parameter with
    /// [`UrlTypeError::SegmentMismatch`](crate::UrlTypeError::SegmentMismatch).
    #[default]
    Fatal,
    /// Skip the type and resolve the raw segment as a plain string.
    Passthrough,
}

impl FromStr for MismatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fatal" => Ok(Self::Fatal),
            "passthrough" => Ok(Self::Passthrough),
            other => Err(format!("unknown mismatch policy: {other}")),
        }
    }
}

/// The complete set of router settings.
///
/// # Examples
///
/// ```
/// use urltype_core::settings::RouterSettings;
///
/// let settings = RouterSettings::default();
/// assert!(settings.use_hash);
/// assert_eq!(settings.hash_prefix, "#");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterSettings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log level filter (e.g. "info", "debug", "urltype_router=trace").
    pub log_level: String,

    // ── URL generation ───────────────────────────────────────────────

    /// Whether generated URLs are hash-based.
    pub use_hash: bool,
    /// The marker prepended to hash-based URLs.
    pub hash_prefix: String,
    /// A base path prepended to every generated URL (after the hash marker).
    pub base_url: String,
    /// Whether represented segments are percent-encoded.
    pub encode_segments: bool,

    // ── Types ────────────────────────────────────────────────────────

    /// How null values are represented.
    pub null_policy: NullPolicy,
    /// How segments failing their type's pattern are handled.
    pub mismatch_policy: MismatchPolicy,
    /// Whether the built-in types (`int`, `string`, ...) are registered.
    pub register_builtin_types: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            // Core
            debug: true,
            log_level: "info".to_string(),

            // URL generation
            use_hash: true,
            hash_prefix: "#".to_string(),
            base_url: String::new(),
            encode_segments: true,

            // Types
            null_policy: NullPolicy::Empty,
            mismatch_policy: MismatchPolicy::Fatal,
            register_builtin_types: true,
        }
    }
}

impl RouterSettings {
    /// Returns the prefix placed before every generated path.
    ///
    /// ```
    /// use urltype_core::settings::RouterSettings;
    ///
    /// let mut settings = RouterSettings::default();
    /// assert_eq!(settings.url_prefix(), "#");
    ///
    /// settings.use_hash = false;
    /// settings.base_url = "/app".to_string();
    /// assert_eq!(settings.url_prefix(), "/app");
    /// ```
    pub fn url_prefix(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.use_hash {
            format!("{}{base}", self.hash_prefix)
        } else {
            base.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = RouterSettings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert!(s.use_hash);
        assert_eq!(s.hash_prefix, "#");
        assert!(s.base_url.is_empty());
        assert!(s.encode_segments);
        assert_eq!(s.null_policy, NullPolicy::Empty);
        assert_eq!(s.mismatch_policy, MismatchPolicy::Fatal);
        assert!(s.register_builtin_types);
    }

    #[test]
    fn test_url_prefix_strips_trailing_slash() {
        let s = RouterSettings {
            base_url: "/app/".to_string(),
            ..RouterSettings::default()
        };
        assert_eq!(s.url_prefix(), "#/app");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Reject".parse::<NullPolicy>().unwrap(), NullPolicy::Reject);
        assert_eq!(" empty ".parse::<NullPolicy>().unwrap(), NullPolicy::Empty);
        assert!("omit".parse::<NullPolicy>().is_err());
        assert_eq!(
            "passthrough".parse::<MismatchPolicy>().unwrap(),
            MismatchPolicy::Passthrough
        );
        assert!("skip".parse::<MismatchPolicy>().is_err());
    }

    #[test]
    fn test_policies_serialize_lowercase() {
        let json = serde_json::to_value(NullPolicy::Reject).unwrap();
        assert_eq!(json, serde_json::json!("reject"));
        let json = serde_json::to_value(MismatchPolicy::Passthrough).unwrap();
        assert_eq!(json, serde_json::json!("passthrough"));
    }
}
