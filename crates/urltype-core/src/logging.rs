//! Logging integration for urltype.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`RouterSettings`] and for creating per-transition spans.

use crate::settings::RouterSettings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level`. In debug mode a pretty,
/// human-readable format is used; otherwise a structured JSON format is used.
/// Installing a second subscriber is a no-op.
pub fn setup_logging(settings: &RouterSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one navigation transition.
///
/// Every parameter resolution of the transition runs inside this span, so log
/// entries from user-supplied types carry the transition id and target state.
///
/// # Examples
///
/// ```
/// use urltype_core::logging::transition_span;
///
/// let span = transition_span(3, "sync-async");
/// let _guard = span.enter();
/// tracing::info!("resolving parameters");
/// ```
pub fn transition_span(transition_id: u64, state: &str) -> tracing::Span {
    tracing::info_span!("transition", id = transition_id, state = state)
}
