//! Error types for urltype.
//!
//! [`UrlTypeError`] covers the whole lifecycle of a typed URL parameter:
//! configuration-time failures (unknown or duplicate types, malformed
//! patterns), per-navigation failures (segment mismatches, failed resolves,
//! superseded transitions) and representation failures during URL generation.

use thiserror::Error;

/// A boxed, thread-safe error produced by user-supplied resolve functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The primary error type for urltype.
///
/// Configuration errors are fatal at startup; the remaining variants reject a
/// single transition or URL generation and leave the router untouched.
#[derive(Error, Debug)]
pub enum UrlTypeError {
    // ── Registry ─────────────────────────────────────────────────────

    /// No type with this name has been registered.
    #[error("Unknown url type: {0}")]
    UnknownType(String),

    /// A type with this name is already registered.
    #[error("Url type already registered: {0}")]
    DuplicateType(String),

    // ── Resolution ───────────────────────────────────────────────────

    /// A raw segment does not satisfy the type's match pattern.
    #[error("Segment '{segment}' for parameter '{param}' does not match type '{type_name}'")]
    SegmentMismatch {
        /// The parameter being resolved.
        param: String,
        /// The type the parameter is declared with.
        type_name: String,
        /// The raw segment that was rejected.
        segment: String,
    },

    /// A type's resolve function failed.
    #[error("Failed to resolve parameter '{param}' as '{type_name}': {source}")]
    Resolution {
        /// The parameter being resolved.
        param: String,
        /// The type the parameter is declared with.
        type_name: String,
        /// The underlying failure reported by the type.
        #[source]
        source: BoxError,
    },

    /// A transition could not resolve its typed parameters.
    ///
    /// Carries the first failure by completion order.
    #[error("Transition {transition} failed to resolve parameters: {source}")]
    TransitionResolution {
        /// The id of the failed transition.
        transition: u64,
        /// The first underlying failure.
        #[source]
        source: Box<UrlTypeError>,
    },

    /// A newer transition started before this one settled.
    #[error("Transition {0} was superseded")]
    TransitionSuperseded(u64),

    // ── Representation ───────────────────────────────────────────────

    /// A null or absent value was represented under a rejecting null policy.
    ///
    /// Carries the name of the type asked to represent it.
    #[error("Missing value for url type '{0}'")]
    MissingValue(String),

    /// A type could not represent the given value.
    #[error("Cannot represent value as '{type_name}': {message}")]
    Representation {
        /// The type asked to represent the value.
        type_name: String,
        /// What went wrong.
        message: String,
    },

    // ── Patterns and states ──────────────────────────────────────────

    /// A URL template is malformed.
    #[error("Invalid url pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending template.
        pattern: String,
        /// What went wrong.
        message: String,
    },

    /// No state with this name has been registered.
    #[error("Unknown state: {0}")]
    UnknownState(String),

    /// A state with this name is already registered.
    #[error("State already registered: {0}")]
    DuplicateState(String),

    /// No registered state matches the URL.
    #[error("No state matches url '{0}'")]
    NoMatch(String),

    /// A URL was generated without a value for one of its parameters.
    #[error("No value provided for parameter '{0}'")]
    MissingParameter(String),

    /// Navigation parameters were not given as a map.
    #[error("Invalid navigation parameters: {0}")]
    InvalidParams(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The router is improperly configured.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl UrlTypeError {
    /// Wraps a resolve failure, tagging it with the parameter and type names.
    pub fn resolution(
        param: impl Into<String>,
        type_name: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Resolution {
            param: param.into(),
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for errors that are fatal at startup rather than per navigation.
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateType(_)
                | Self::DuplicateState(_)
                | Self::InvalidPattern { .. }
                | Self::ConfigurationError(_)
                | Self::ImproperlyConfigured(_)
        )
    }

    /// Returns the parameter this error is tagged with, if any.
    ///
    /// Looks through [`UrlTypeError::TransitionResolution`] to the wrapped cause.
    pub fn param(&self) -> Option<&str> {
        match self {
            Self::SegmentMismatch { param, .. } | Self::Resolution { param, .. } => {
                Some(param.as_str())
            }
            Self::MissingParameter(param) => Some(param.as_str()),
            Self::TransitionResolution { source, .. } => source.param(),
            _ => None,
        }
    }
}

/// A convenience type alias for `Result<T, UrlTypeError>`.
pub type UrlTypeResult<T> = Result<T, UrlTypeError>;
